//! Employee validation demo
//!
//! Run with: cargo run -p employee-validation
//!
//! Validates one invalid and one valid employee record and prints the
//! payload a web boundary would send back. Engine settings come from
//! `VIGIL_MAX_DEPTH` / `VIGIL_FAIL_FAST`; log output from `RUST_LOG`.

use tracing_subscriber::EnvFilter;
use vigil_validate::prelude::*;

#[derive(Debug, Constrained)]
struct Address {
    #[validate(not_blank)]
    city: String,

    #[validate(pattern(regexp = "[0-9]{2}-[0-9]{3}"), message = "postal code must look like 00-000")]
    postal_code: String,
}

#[derive(Debug, Constrained)]
struct Employee {
    #[validate(not_blank, size(max = 80))]
    name: String,

    #[validate(email)]
    email: String,

    #[validate(min(value = 18), message = "Age should not be less than {value}")]
    #[validate(max(value = 100), message = "Age should not be greater than {value}")]
    age: u32,

    #[validate(positive, message = "Salary must be positive")]
    salary: f64,

    #[validate(nested)]
    address: Option<Address>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let engine = Engine::builder()
        .config(EngineConfig::from_env()?)
        .preload::<Employee>()
        .build()?;
    tracing::info!(max_depth = engine.config().max_depth, "engine ready");

    let john = Employee {
        name: "John".to_string(),
        email: "john.doe@example.com".to_string(),
        age: 15,
        salary: -1000.00,
        address: None,
    };
    report(&engine, "john", john);

    let jane = Employee {
        name: "Jane".to_string(),
        email: "jane@example.com".to_string(),
        age: 34,
        salary: 5200.00,
        address: Some(Address {
            city: "Warsaw".to_string(),
            postal_code: "00-950".to_string(),
        }),
    };
    report(&engine, "jane", jane);

    Ok(())
}

fn report(engine: &Engine, label: &str, employee: Employee) {
    match engine.validated(employee) {
        Ok(employee) => {
            tracing::info!(label, "valid");
            println!("{label}: accepted {employee:?}");
        }
        Err(rejection) => {
            if let Some(violations) = rejection.violations() {
                for violation in violations {
                    tracing::debug!(label, path = %violation.path, kind = %violation.kind, "violation");
                }
            }
            let payload = rejection.to_payload();
            match serde_json::to_string_pretty(&payload) {
                Ok(body) => println!("{label}: {} {body}", rejection.status_code()),
                Err(err) => tracing::error!(label, error = %err, "could not render payload"),
            }
        }
    }
}
