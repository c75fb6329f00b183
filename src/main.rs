//! Trolley cart CLI

use std::{
    io::{self, Write},
    process::ExitCode,
};

use thiserror::Error;
use tracing::{debug, error};

use trolley::{
    config::{Cli, Command},
    fixtures::{Fixture, FixtureError},
    logging,
    orders::RecordingOrderSink,
    pricing::PricingEngine,
    products::ProductId,
    receipt::{Receipt, ReceiptError, write_coupon_table},
    repository::JsonFileCartRepository,
    service::{CartService, CartServiceError},
};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Service(#[from] CartServiceError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

pub fn main() -> ExitCode {
    // Load configuration from .env and CLI arguments
    let cli = Cli::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = logging::init_subscriber(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for subscriber errors"
        )]
        {
            eprintln!("Failed to initialise logging: {error}");
        }

        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");

            #[expect(clippy::print_stderr, reason = "user-facing error message")]
            {
                eprintln!("{err}");
            }

            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let store = cli.store;

    let mut fixture = Fixture::with_base_path(&store.fixtures);

    fixture.load_products(&store.set)?.load_coupons(&store.set)?;

    if let Some(name) = &store.config {
        fixture.load_config(name)?;
    }

    let engine = PricingEngine::new(cli.pricing.apply(fixture.pricing_config()?));
    let currency = engine.config().currency;
    let (catalog, coupons) = fixture.into_parts();

    let service = CartService::new(
        JsonFileCartRepository::new(&store.state),
        catalog,
        coupons,
        RecordingOrderSink::new(),
        engine,
    );

    let owner = store.owner_id();
    let owner = owner.as_ref();
    let mut out = io::stdout().lock();

    debug!(
        command = ?cli.command,
        product = ?cli.command.product_id(),
        state = %store.state.display(),
        "running command"
    );

    let priced = match cli.command {
        Command::Show => service.view(owner)?,
        Command::Add { product, quantity } => {
            service.add_item(owner, ProductId(product), quantity)?
        }
        Command::Set { product, quantity } => {
            service.set_quantity(owner, ProductId(product), quantity)?
        }
        Command::Remove { product } => service.remove_item(owner, ProductId(product))?,
        Command::ApplyCoupon { code } => service.apply_coupon(owner, &code)?,
        Command::RemoveCoupon => service.remove_coupon(owner)?,
        Command::Clear => service.clear(owner)?,
        Command::Coupons => {
            write_coupon_table(&mut out, &service.available_coupons(), currency)?;

            return Ok(());
        }
        Command::Checkout => {
            let checkout = service.checkout(owner)?;

            writeln!(
                out,
                "Order {} placed, total {}\n",
                checkout.order_id(),
                checkout.order.totals.total
            )?;

            checkout.cart
        }
    };

    Receipt::new(&priced, service.engine()).write_to(&mut out, service.catalog())?;

    Ok(())
}
