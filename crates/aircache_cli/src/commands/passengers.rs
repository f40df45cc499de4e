//! Passenger commands.

use super::{report_remote, Context};
use aircache_store::{Booking, MembershipLevel, Passenger, PassengerId, ProfileImage};
use serde::Serialize;
use std::path::PathBuf;

/// Field values given on the command line. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct PassengerFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub membership: Option<MembershipLevel>,
    pub active: Option<bool>,
    pub image: Option<PathBuf>,
}

impl PassengerFields {
    /// Overlays the given fields onto `passenger`.
    fn apply(self, mut passenger: Passenger) -> Result<Passenger, Box<dyn std::error::Error>> {
        if let Some(name) = self.name {
            passenger.full_name = name;
        }
        if let Some(email) = self.email {
            passenger.email = email;
        }
        if let Some(phone) = self.phone {
            passenger.phone = phone;
        }
        if let Some(dob) = self.dob {
            passenger.date_of_birth = Some(dob);
        }
        if let Some(level) = self.membership {
            passenger.membership_level = level;
        }
        if let Some(active) = self.active {
            passenger.is_active = active;
        }
        if let Some(path) = self.image {
            let bytes = std::fs::read(&path)
                .map_err(|e| format!("cannot read image {}: {e}", path.display()))?;
            passenger.profile_image = Some(ProfileImage::from_bytes(&bytes));
        }
        Ok(passenger)
    }
}

/// A passenger as printed by `show`.
#[derive(Debug, Serialize)]
struct PassengerDetail {
    #[serde(flatten)]
    passenger: Passenger,
    bookings: Vec<Booking>,
}

/// Runs the list command.
pub fn list(ctx: &Context, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let passengers = ctx.cache.list_passengers()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&passengers)?);
        }
        _ => {
            if passengers.is_empty() {
                println!("No cached passengers");
                return Ok(());
            }
            println!(
                "{:>6}  {:<24} {:<28} {:<12} {}",
                "ID", "NAME", "EMAIL", "MEMBERSHIP", "ACTIVE"
            );
            for p in &passengers {
                println!(
                    "{:>6}  {:<24} {:<28} {:<12} {}",
                    id_label(p.id),
                    p.full_name,
                    p.email,
                    p.membership_level,
                    if p.is_active { "yes" } else { "no" }
                );
            }
        }
    }

    Ok(())
}

/// Runs the show command.
pub fn show(ctx: &Context, id: PassengerId, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let detail = PassengerDetail {
        passenger: ctx.cache.get_passenger(id)?,
        bookings: ctx.cache.list_bookings(id)?,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        _ => print_detail(&detail),
    }

    Ok(())
}

fn print_detail(detail: &PassengerDetail) {
    let p = &detail.passenger;
    println!("Passenger {}", id_label(p.id));
    println!("==============");
    println!("Name:          {}", p.full_name);
    println!("Email:         {}", p.email);
    println!("Phone:         {}", p.phone);
    println!(
        "Date of birth: {}",
        p.date_of_birth.as_deref().unwrap_or("-")
    );
    println!("Membership:    {}", p.membership_level);
    println!("Active:        {}", if p.is_active { "yes" } else { "no" });
    match &p.profile_image {
        Some(image) => println!("Image:         {} base64 chars", image.as_encoded().len()),
        None => println!("Image:         -"),
    }

    println!();
    if detail.bookings.is_empty() {
        println!("No bookings");
        return;
    }
    println!("Bookings:");
    for b in &detail.bookings {
        println!(
            "  #{:<5} {:<8} {}  seat {:<5} {}",
            b.id.map(|id| id.to_string()).unwrap_or_default(),
            b.flight_number,
            b.booking_date,
            b.seat_number.as_deref().unwrap_or("-"),
            b.status
        );
    }
}

/// Runs the add command.
pub async fn add(ctx: &Context, fields: PassengerFields) -> Result<(), Box<dyn std::error::Error>> {
    let name = fields.name.clone().ok_or("a name is required")?;
    let email = fields.email.clone().ok_or("an email is required")?;
    let passenger = fields.apply(Passenger::new(name, email, ""))?;

    let receipt = ctx.cache.coordinator().create_or_update(passenger)?;
    println!("Added passenger {}", receipt.id);
    report_remote(receipt.remote).await;
    Ok(())
}

/// Runs the edit command.
pub async fn edit(
    ctx: &Context,
    id: PassengerId,
    fields: PassengerFields,
) -> Result<(), Box<dyn std::error::Error>> {
    let current = ctx.cache.get_passenger(id)?;
    let passenger = fields.apply(current)?;

    let receipt = ctx.cache.coordinator().create_or_update(passenger)?;
    println!("Updated passenger {}", receipt.id);
    report_remote(receipt.remote).await;
    Ok(())
}

/// Runs the delete command.
pub async fn delete(ctx: &Context, id: PassengerId) -> Result<(), Box<dyn std::error::Error>> {
    let receipt = ctx.cache.coordinator().delete(id)?;
    println!("Deleted passenger {}", receipt.id);
    report_remote(receipt.remote).await;
    Ok(())
}

fn id_label(id: Option<PassengerId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".into())
}
