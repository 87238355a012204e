//! End-to-end tests for the typed mapping façades
//!
//! These tests exercise `Mapper` and the process-wide `global` façade
//! through real shapes, from registration to materialized destinations.

mod test_support;

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shapeshift_core::{global, shape, Error, Expr, Mapper, MemberRule, ShapeRef};
use std::collections::{BTreeMap, HashMap, VecDeque};
use test_support::*;

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Person {
        id: i32,
        name: String,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct PersonView {
        id: i32,
        name: String,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Shipment {
        address: Address,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct ShipmentAsList {
        address: Vec<AddressDto>,
    }
}

#[test]
fn test_primitive_round_trip() {
    init_tracing();
    let mapper = Mapper::new();
    let person = Person {
        id: 7,
        name: "Ada".to_string(),
    };

    let view: PersonView = mapper.map(&person).unwrap();
    assert_eq!(
        view,
        PersonView {
            id: 7,
            name: "Ada".to_string(),
        }
    );

    let back: Person = mapper.map(&view).unwrap();
    assert_eq!(back, person);
}

#[test]
fn test_deep_mapping_of_a_customer() {
    init_tracing();
    let mapper = Mapper::new();
    let dto: CustomerDto = mapper.map(&customer()).unwrap();

    assert_eq!(dto.id, 7);
    assert_eq!(dto.name, "Ada");
    assert_eq!(
        dto.address,
        Some(AddressDto {
            street: "12 Analytical Way".to_string(),
            city: Some(CityDto {
                name: "London".to_string(),
                population: 8_900_000,
            }),
        })
    );
    // unmatched destination member keeps its default
    assert_eq!(dto.loyalty_tier, None);
}

#[test]
fn test_list_to_array_preserves_order() {
    let mapper = Mapper::new();
    let dto: CustomerDto = mapper.map(&customer()).unwrap();
    assert_eq!(dto.orders, [3, 1, 2]);
}

#[test]
fn test_map_to_pair_sequence() {
    let mapper = Mapper::new();
    let dto: CustomerDto = mapper.map(&customer()).unwrap();

    let mut attributes = dto.attributes.clone();
    attributes.sort();
    assert_eq!(
        attributes,
        vec![
            ("channel".to_string(), "web".to_string()),
            ("tier".to_string(), "gold".to_string()),
        ]
    );
}

#[test]
fn test_object_to_sequence_is_rejected() {
    let mapper = Mapper::new();
    let err = mapper
        .map::<Shipment, ShipmentAsList>(&Shipment::default())
        .unwrap_err();

    match err {
        Error::Configuration { pair, member, message } => {
            assert_eq!(pair, "Shipment -> ShipmentAsList");
            assert_eq!(member.as_deref(), Some("address"));
            assert!(message.contains("navigation type mismatch"), "{}", message);
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn test_shallow_versus_deep() {
    let mapper = Mapper::new();
    let source = customer();

    let shallow: CustomerDto = mapper.map_shallow(&source).unwrap();
    assert_eq!(shallow.id, 7);
    assert_eq!(shallow.name, "Ada");
    assert_eq!(shallow.address, None);
    assert_eq!(shallow.orders, [0, 0, 0]);
    assert!(shallow.attributes.is_empty());

    let deep: CustomerDto = mapper.map(&source).unwrap();
    assert!(deep.address.is_some());
    assert_eq!(deep.orders, [3, 1, 2]);
}

#[test]
fn test_map_into_updates_the_same_destination() {
    let mapper = Mapper::new();
    let mut dto = CustomerDto {
        loyalty_tier: Some("platinum".to_string()),
        ..CustomerDto::default()
    };
    let target: *const CustomerDto = &dto;

    let returned = mapper.map_into(&customer(), &mut dto).unwrap();
    assert!(std::ptr::eq(returned, target));

    assert_eq!(dto.name, "Ada");
    assert_eq!(dto.loyalty_tier.as_deref(), Some("platinum"));
}

#[test]
fn test_map_to_collections() {
    let mapper = Mapper::new();
    let cities = vec![city("Oslo", 700_000), city("Bergen", 285_000)];

    let all: Vec<CityDto> = mapper.map_all(&cities).unwrap();
    assert_eq!(all[1].name, "Bergen");

    let array: [CityDto; 2] = mapper.map_to_array(&cities).unwrap();
    assert_eq!(array[0].population, 700_000);

    let queue = mapper
        .map_to_collection::<City, CityDto, _, VecDeque<_>>(&cities)
        .unwrap();
    assert_eq!(queue.front().map(|c| c.name.as_str()), Some("Oslo"));

    let err = mapper.map_to_array::<City, CityDto, 3>(&cities).unwrap_err();
    assert!(matches!(err, Error::Materialization { .. }), "{:?}", err);
}

#[test]
fn test_map_dictionary_converts_keys_and_values() {
    let mapper = Mapper::new();
    let source = HashMap::from([(1_i32, city("Lima", 9_700_000)), (2, city("Cusco", 430_000))]);

    let mapped: BTreeMap<i64, CityDto> = mapper
        .map_dictionary::<i32, City, i64, CityDto, _, _>(&source)
        .unwrap();

    assert_eq!(mapped.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(mapped[&2].name, "Cusco");
}

#[test]
fn test_map_dictionary_rejects_unconvertible_keys() {
    let mapper = Mapper::new();
    let source = HashMap::from([(1_i32, city("Lima", 1))]);

    let err = mapper
        .map_dictionary::<i32, City, chrono::NaiveDate, CityDto, _, BTreeMap<_, _>>(&source)
        .unwrap_err();
    assert!(err.is_configuration(), "{:?}", err);
}

#[test]
fn test_dynamic_and_registered_destinations() {
    let mapper = Mapper::new();
    let source = city("Quito", 2_800_000);

    assert!(mapper.map_to_registered(&source).unwrap_err().is_configuration());

    mapper.register_pair::<City, CityDto>().unwrap();
    let registered = mapper.map_to_registered(&source).unwrap();
    assert_eq!(registered, json!({"name": "Quito", "population": 2_800_000}));

    let dynamic = mapper.map_dynamic(&source, ShapeRef::of::<CityDto>()).unwrap();
    assert_eq!(dynamic, registered);

    // lazily built pairs are not registrations
    mapper.map_dynamic(&source, ShapeRef::of::<City>()).unwrap();
    assert_eq!(mapper.map_to_registered(&source).unwrap(), registered);

    mapper.register_pair::<City, Person>().unwrap();
    let err = mapper.map_to_registered(&source).unwrap_err();
    assert!(err.to_string().contains("ambiguous destination"), "{}", err);
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mapper = Mapper::new();
    mapper.register_pair::<Person, PersonView>().unwrap();

    let err = mapper.register_pair::<Person, PersonView>().unwrap_err();
    assert_eq!(
        err,
        Error::DuplicateRegistration {
            source_type: "Person".to_string(),
            destination_type: "PersonView".to_string(),
        }
    );
}

#[test]
fn test_registered_overrides_apply() {
    let mapper = Mapper::new();
    mapper
        .register_with::<Customer, CustomerDto, _>(|map| {
            map.constant("loyalty_tier", "gold")
                .expression("name", Expr::path("address.city.name"))
                .skip("orders")
        })
        .unwrap();

    let dto: CustomerDto = mapper.map(&customer()).unwrap();
    assert_eq!(dto.loyalty_tier.as_deref(), Some("gold"));
    assert_eq!(dto.name, "London");
    assert_eq!(dto.orders, [0, 0, 0]);

    let plan = mapper.plan::<Customer, CustomerDto>().unwrap();
    assert!(matches!(plan.member("orders").map(|m| m.rule()), Some(MemberRule::Skip)));
}

#[test]
fn test_custom_construction() {
    let mapper = Mapper::new();
    mapper
        .register_construction(|person: &Person| {
            anyhow::ensure!(!person.name.is_empty(), "a person needs a name");
            Ok(PersonView {
                id: person.id,
                name: person.name.to_uppercase(),
            })
        })
        .unwrap();

    let view: PersonView = mapper
        .map(&Person {
            id: 1,
            name: "grace".to_string(),
        })
        .unwrap();
    assert_eq!(view.name, "GRACE");

    let err = mapper.map::<Person, PersonView>(&Person::default()).unwrap_err();
    assert!(err.to_string().contains("a person needs a name"), "{}", err);
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Parcel {
        weight: f64,
        label: String,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct ParcelDto {
        weight: u32,
        label: String,
    }
}

#[test]
fn test_global_facade() {
    global::register_pair::<Parcel, ParcelDto>().unwrap();
    assert!(global::register_pair::<Parcel, ParcelDto>().is_err());

    let parcels = vec![
        Parcel {
            weight: 2.7,
            label: "fragile".to_string(),
        },
        Parcel {
            weight: 10.0,
            label: "books".to_string(),
        },
    ];
    let mapped: Vec<ParcelDto> = global::map_all(&parcels).unwrap();
    assert_eq!(mapped[0].weight, 2);
    assert_eq!(mapped[1].label, "books");

    let projected: Vec<ParcelDto> = global::project_to(&parcels).unwrap();
    assert_eq!(projected, mapped);
    assert!(global::stats().registrations >= 1);

    let by_label: HashMap<String, Parcel> = parcels.iter().map(|p| (p.label.clone(), p.clone())).collect();
    let dictionary: BTreeMap<String, ParcelDto> =
        global::map_dictionary::<String, Parcel, String, ParcelDto, _, _>(&by_label).unwrap();
    assert_eq!(dictionary.keys().cloned().collect::<Vec<_>>(), vec!["books", "fragile"]);
    assert_eq!(dictionary["fragile"].weight, 2);

    let projection = global::project_with::<Parcel, ParcelDto, _, &str>([]).unwrap();
    assert!(projection.metadata().deferred.is_empty());
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Reading {
        sensor: String,
        value: f64,
        history: Vec<f32>,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct ReadingDto {
        sensor: String,
        value: f64,
        history: Vec<f64>,
    }
}

#[test]
fn test_non_finite_floats_are_rejected() {
    let mapper = Mapper::new();
    let reading = |value: f64, history: Vec<f32>| Reading {
        sensor: "t1".to_string(),
        value,
        history,
    };

    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = mapper.map::<Reading, ReadingDto>(&reading(value, Vec::new())).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref path, .. } if path == "value"), "{:?}", err);

        let err = mapper
            .project_to::<Reading, ReadingDto, _>(&[reading(value, Vec::new())])
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }), "{:?}", err);
    }

    let err = mapper
        .map::<Reading, ReadingDto>(&reading(1.0, vec![0.5, f32::NAN]))
        .unwrap_err();
    assert!(matches!(err, Error::Conversion { ref path, .. } if path == "history.1"), "{:?}", err);

    let dto: ReadingDto = mapper.map(&reading(-0.25, vec![1.5])).unwrap();
    assert_eq!(dto.value, -0.25);
    assert_eq!(dto.history, vec![1.5]);
}

#[test]
fn test_deep_chains_map_without_a_depth_limit() {
    let mapper = Mapper::new();
    let dto: EmployeeDto = mapper.map(&management_chain(100)).unwrap();

    let depth = std::iter::successors(dto.manager.as_deref(), |e| e.manager.as_deref()).count();
    assert_eq!(depth, 100);
    assert_eq!(dto.name, "level-99");
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Tagged {
        tags: Vec<String>,
        by_id: HashMap<i32, String>,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TaggedDto {
        tags: [String; 3],
        by_id: Vec<(i32, String)>,
    }
}

#[test]
fn test_array_and_pair_targets() {
    let mapper = Mapper::new();
    let source = Tagged {
        tags: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        by_id: HashMap::from([(1, "x".to_string()), (2, "y".to_string())]),
    };

    let dto: TaggedDto = mapper.map(&source).unwrap();
    assert_eq!(dto.tags, ["a", "b", "c"].map(String::from));

    let mut pairs = dto.by_id;
    pairs.sort();
    assert_eq!(pairs, vec![(1, "x".to_string()), (2, "y".to_string())]);
}
