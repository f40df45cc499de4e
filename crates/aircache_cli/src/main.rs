//! AirCache CLI
//!
//! Command-line client for the offline-first passenger cache.
//!
//! # Commands
//!
//! - `list` - List cached passengers
//! - `show` - Show one passenger and its bookings
//! - `add` / `edit` / `delete` - Write passengers (local first, then remote)
//! - `book` / `bookings` / `cancel-booking` - Manage bookings
//! - `reconcile` - Refresh the cache from the remote store

mod commands;

use aircache_store::{Booking, BookingId, BookingStatus, MembershipLevel, PassengerId};
use clap::{Parser, Subcommand};
use commands::Context;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// AirCache command-line client.
#[derive(Parser, Debug)]
#[command(name = "aircache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local cache database
    #[arg(global = true, long, default_value = "aircache.db")]
    db: PathBuf,

    /// Base URL of the remote service
    #[arg(global = true, long, default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Remote request timeout in seconds
    #[arg(global = true, long, default_value = "10")]
    timeout_secs: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List cached passengers
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show a passenger and its bookings
    Show {
        /// Passenger identity
        id: i64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add a passenger
    Add {
        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Phone number
        #[arg(long, default_value = "")]
        phone: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<String>,

        /// Membership level (Economy, Premium, Business, First Class)
        #[arg(long)]
        membership: Option<MembershipLevel>,

        /// Mark the account inactive
        #[arg(long)]
        inactive: bool,

        /// Profile image file
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Edit a passenger
    Edit {
        /// Passenger identity
        id: i64,

        /// Full name
        #[arg(long)]
        name: Option<String>,

        /// Email address
        #[arg(long)]
        email: Option<String>,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<String>,

        /// Membership level (Economy, Premium, Business, First Class)
        #[arg(long)]
        membership: Option<MembershipLevel>,

        /// Set the active flag
        #[arg(long)]
        active: Option<bool>,

        /// Profile image file
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete a passenger and its bookings
    Delete {
        /// Passenger identity
        id: i64,
    },

    /// Book a flight for a passenger
    Book {
        /// Passenger identity
        passenger_id: i64,

        /// Flight number
        #[arg(long)]
        flight: String,

        /// Booking date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Seat label
        #[arg(long)]
        seat: Option<String>,

        /// Booking status (Confirmed, Pending, Cancelled)
        #[arg(long, default_value = "Pending")]
        status: BookingStatus,
    },

    /// List the bookings of a passenger
    Bookings {
        /// Passenger identity
        passenger_id: i64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Mark a booking cancelled
    CancelBooking {
        /// Booking identity
        id: i64,
    },

    /// Refresh the cache from the remote store
    Reconcile {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let timeout = Duration::from_secs(cli.timeout_secs);
    let open = || Context::open(&cli.db, &cli.server, timeout);

    match cli.command {
        Commands::List { format } => commands::passengers::list(&open()?, &format)?,
        Commands::Show { id, format } => {
            commands::passengers::show(&open()?, PassengerId(id), &format)?
        }
        Commands::Add {
            name,
            email,
            phone,
            dob,
            membership,
            inactive,
            image,
        } => {
            let fields = commands::passengers::PassengerFields {
                name: Some(name),
                email: Some(email),
                phone: Some(phone),
                dob,
                membership,
                active: Some(!inactive),
                image,
            };
            commands::passengers::add(&open()?, fields).await?
        }
        Commands::Edit {
            id,
            name,
            email,
            phone,
            dob,
            membership,
            active,
            image,
        } => {
            let fields = commands::passengers::PassengerFields {
                name,
                email,
                phone,
                dob,
                membership,
                active,
                image,
            };
            commands::passengers::edit(&open()?, PassengerId(id), fields).await?
        }
        Commands::Delete { id } => {
            commands::passengers::delete(&open()?, PassengerId(id)).await?
        }
        Commands::Book {
            passenger_id,
            flight,
            date,
            seat,
            status,
        } => {
            let booking = Booking::new(PassengerId(passenger_id), flight, date).with_status(status);
            let booking = match seat {
                Some(seat) => booking.with_seat(seat),
                None => booking,
            };
            commands::bookings::book(&open()?, booking).await?
        }
        Commands::Bookings {
            passenger_id,
            format,
        } => commands::bookings::list(&open()?, PassengerId(passenger_id), &format)?,
        Commands::CancelBooking { id } => {
            commands::bookings::cancel(&open()?, BookingId(id)).await?
        }
        Commands::Reconcile { format } => commands::reconcile::run(&open()?, &format).await?,
        Commands::Version => {
            println!("AirCache CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Store schema v{}", aircache_store::SCHEMA_VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "aircache",
            "list",
            "--db",
            "/tmp/cache.db",
            "--server",
            "http://10.0.2.2:3000",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/cache.db"));
        assert_eq!(cli.server, "http://10.0.2.2:3000");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::List { .. }));
    }

    #[test]
    fn membership_is_parsed() {
        let cli = Cli::try_parse_from([
            "aircache",
            "add",
            "--name",
            "Ada",
            "--email",
            "ada@example.com",
            "--membership",
            "first class",
        ])
        .unwrap();
        match cli.command {
            Commands::Add { membership, .. } => {
                assert_eq!(membership, Some(MembershipLevel::FirstClass))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = Cli::try_parse_from([
            "aircache", "book", "1", "--flight", "MA1", "--date", "2025-01-01", "--status",
            "lost",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["aircache", "reconcile"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("aircache.db"));
        assert_eq!(cli.timeout_secs, 10);
        assert!(!cli.verbose);
    }
}
