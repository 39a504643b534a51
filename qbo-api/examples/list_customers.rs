//! List every customer of a company
//!
//! ```sh
//! QBO_ACCESS_TOKEN=... QBO_COMPANY_ID=9130 QBO_ENVIRONMENT=sandbox \
//! QBO_LOG_MODE=development cargo run --example list_customers -- "Active = true"
//! ```

use std::ops::ControlFlow;

use qbo_api::entities::Customer;
use qbo_api::logging::init_logging_from_env;
use qbo_api::{ApiError, Entity, QboClient, ServiceConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    let config = ServiceConfig::from_env()?;
    let mut client = QboClient::from_config(&config)?;

    let filter = std::env::args()
        .nth(1)
        .map(|clause| format!("{} WHERE {}", Customer::default_query(), clause));

    let result = client.query_in_batches::<Customer, _>(filter.as_deref(), 100, |batch, page| {
        println!("page {} ({} of {:?})", page, batch.count, batch.total_count);
        for customer in batch {
            println!(
                "  {:>6}  {}",
                customer.id.unwrap_or_default(),
                customer.display_name.unwrap_or_default()
            );
        }
        ControlFlow::Continue(())
    });

    match result {
        Err(ApiError::Request(fault)) => {
            eprintln!("service fault {} ({}): {}", fault.code, fault.error_type, fault.message);
            if !fault.detail.is_empty() {
                eprintln!("  {}", fault.detail);
            }
            std::process::exit(1);
        }
        other => Ok(other?),
    }
}
