//! Integration tests for query projections
//!
//! These tests verify that projections agree with eager mapping and that
//! include hints expand recursive members per query.

mod test_support;

use pretty_assertions::assert_eq;
use shapeshift_core::{Binding, Error, Expr, Mapper, ShapeRef};
use std::sync::Arc;
use test_support::*;

#[test]
fn test_project_to_matches_map() {
    init_tracing();
    let mapper = Mapper::new();
    let customers = vec![
        customer(),
        Customer {
            id: 8,
            address: None,
            ..customer()
        },
    ];

    let projected: Vec<CustomerDto> = mapper.project_to(&customers).unwrap();
    let mapped: Vec<CustomerDto> = mapper.map_all(&customers).unwrap();

    assert_eq!(projected.len(), 2);
    for (projected, mapped) in projected.iter().zip(&mapped) {
        let mut left = projected.clone();
        let mut right = mapped.clone();
        left.attributes.sort();
        right.attributes.sort();
        assert_eq!(left, right);
    }
    assert_eq!(projected[1].address, None);
}

#[test]
fn test_projection_formula_is_inspectable() {
    let mapper = Mapper::new();
    let projection = mapper.projection::<Address, AddressDto>().unwrap();

    assert_eq!(
        projection.to_string(),
        "x0 => new AddressDto { street = x0.street, city = x0.city?.let(x1 => new CityDto { name = x1.name, population = (x1.population as i64) }) }"
    );
    assert_eq!(projection.metadata().depth, 1);
    assert_eq!(projection.metadata().conversions, 1);
}

#[test]
fn test_cycles_are_cut_by_default() {
    let mapper = Mapper::new();
    let chain = vec![management_chain(3)];

    let projected: Vec<EmployeeDto> = mapper.project_to(&chain).unwrap();
    assert_eq!(projected[0].name, "level-2");
    assert_eq!(projected[0].manager, None);

    // eager mapping follows the whole chain
    let mapped: Vec<EmployeeDto> = mapper.map_all(&chain).unwrap();
    let depth = std::iter::successors(mapped[0].manager.as_deref(), |e| e.manager.as_deref()).count();
    assert_eq!(depth, 3);
}

#[test]
fn test_include_hints_expand_per_query() {
    let mapper = Mapper::new();
    let chain = vec![management_chain(3)];
    let cached = mapper.projection::<Employee, EmployeeDto>().unwrap();

    let projected: Vec<EmployeeDto> = mapper
        .project_to_with_includes(&chain, ["manager.manager"])
        .unwrap();

    let manager = projected[0].manager.as_deref().unwrap();
    assert_eq!(manager.name, "level-1");
    let grand_manager = manager.manager.as_deref().unwrap();
    assert_eq!(grand_manager.name, "level-0");
    assert_eq!(grand_manager.manager, None);

    let after = mapper.projection::<Employee, EmployeeDto>().unwrap();
    assert!(Arc::ptr_eq(&cached, &after));
    assert_eq!(after.metadata().deferred, vec!["manager".to_string()]);
}

#[test]
fn test_project_with_reports_deferred_paths() {
    let mapper = Mapper::new();
    let projection = mapper
        .project_with::<Employee, EmployeeDto, _, _>(["manager"])
        .unwrap();
    assert_eq!(projection.metadata().deferred, vec!["manager.manager".to_string()]);
}

#[test]
fn test_registered_projection_expression() {
    let mapper = Mapper::new();
    let expr = Expr::construct(
        ShapeRef::of::<CityDto>(),
        vec![
            Binding::new("name", false, Expr::path("name")),
            Binding::new("population", false, Expr::constant(serde_json::json!(0))),
        ],
    );
    mapper.register_projection::<City, CityDto>(expr).unwrap();

    let cities = vec![city("Tartu", 97_000)];
    let projected: Vec<CityDto> = mapper.project_to(&cities).unwrap();
    let mapped: Vec<CityDto> = mapper.map_all(&cities).unwrap();

    assert_eq!(projected, vec![CityDto {
        name: "Tartu".to_string(),
        population: 0,
    }]);
    assert_eq!(projected, mapped);
}

#[test]
fn test_construction_function_is_not_projectable() {
    let mapper = Mapper::new();
    mapper
        .register_construction(|c: &City| {
            Ok(CityDto {
                name: c.name.clone(),
                population: i64::from(c.population) * 2,
            })
        })
        .unwrap();

    let err = mapper.projection::<City, CityDto>().unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }), "{:?}", err);

    // eager mapping still works
    let dto: CityDto = mapper.map(&city("Riga", 600_000)).unwrap();
    assert_eq!(dto.population, 1_200_000);
}
