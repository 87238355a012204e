//! Shared test support utilities for integration tests

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use shapeshift_core::shape;
use std::collections::HashMap;
use std::sync::Once;

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct City {
        pub name: String,
        pub population: u32,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct CityDto {
        pub name: String,
        pub population: i64,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Address {
        pub street: String,
        pub city: Option<City>,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct AddressDto {
        pub street: String,
        pub city: Option<CityDto>,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Customer {
        pub id: i32,
        pub name: String,
        pub address: Option<Address>,
        pub orders: Vec<i32>,
        pub attributes: HashMap<String, String>,
        pub internal_notes: String,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct CustomerDto {
        pub id: i64,
        pub name: String,
        pub address: Option<AddressDto>,
        pub orders: [i64; 3],
        pub attributes: Vec<(String, String)>,
        pub loyalty_tier: Option<String>,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Employee {
        pub name: String,
        pub manager: Option<Box<Employee>>,
    }
}

shape! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct EmployeeDto {
        pub name: String,
        pub manager: Option<Box<EmployeeDto>>,
    }
}

static TRACING: Once = Once::new();

/// Route engine logs to the test harness, filtered by `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Create a city
pub fn city(name: &str, population: u32) -> City {
    City {
        name: name.to_string(),
        population,
    }
}

/// Create a fully populated customer
pub fn customer() -> Customer {
    Customer {
        id: 7,
        name: "Ada".to_string(),
        address: Some(Address {
            street: "12 Analytical Way".to_string(),
            city: Some(city("London", 8_900_000)),
        }),
        orders: vec![3, 1, 2],
        attributes: HashMap::from([
            ("tier".to_string(), "gold".to_string()),
            ("channel".to_string(), "web".to_string()),
        ]),
        internal_notes: "do not export".to_string(),
    }
}

/// Create a management chain `levels` deep above a root employee
pub fn management_chain(levels: usize) -> Employee {
    let mut employee = Employee {
        name: "root".to_string(),
        manager: None,
    };
    for level in 0..levels {
        employee = Employee {
            name: format!("level-{}", level),
            manager: Some(Box::new(employee)),
        };
    }
    employee
}
