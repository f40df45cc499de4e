//! Booking commands.

use super::{report_remote, Context};
use aircache_store::{Booking, BookingId, BookingStatus, PassengerId};

/// Runs the book command.
pub async fn book(ctx: &Context, booking: Booking) -> Result<(), Box<dyn std::error::Error>> {
    let passenger_id = booking.passenger_id;
    let receipt = ctx.cache.coordinator().create_or_update_booking(booking)?;
    println!("Booked {} for passenger {}", receipt.id, passenger_id);
    report_remote(receipt.remote).await;
    Ok(())
}

/// Runs the bookings command.
pub fn list(
    ctx: &Context,
    passenger_id: PassengerId,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let bookings = ctx.cache.list_bookings(passenger_id)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&bookings)?);
        }
        _ => {
            if bookings.is_empty() {
                println!("No bookings for passenger {passenger_id}");
                return Ok(());
            }
            println!(
                "{:>6}  {:<8} {:<10}  {:<5} {}",
                "ID", "FLIGHT", "DATE", "SEAT", "STATUS"
            );
            for b in &bookings {
                println!(
                    "{:>6}  {:<8} {:<10}  {:<5} {}",
                    b.id.map(|id| id.to_string()).unwrap_or_default(),
                    b.flight_number,
                    b.booking_date,
                    b.seat_number.as_deref().unwrap_or("-"),
                    b.status
                );
            }
        }
    }

    Ok(())
}

/// Runs the cancel-booking command.
pub async fn cancel(ctx: &Context, id: BookingId) -> Result<(), Box<dyn std::error::Error>> {
    let booking = ctx.cache.get_booking(id)?;
    if booking.status == BookingStatus::Cancelled {
        println!("Booking {id} is already cancelled");
        return Ok(());
    }

    let receipt = ctx
        .cache
        .coordinator()
        .create_or_update_booking(booking.with_status(BookingStatus::Cancelled))?;
    println!("Cancelled booking {}", receipt.id);
    report_remote(receipt.remote).await;
    Ok(())
}
