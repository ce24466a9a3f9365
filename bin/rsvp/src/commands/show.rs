use anyhow::Result;
use clap::Args;
use rsvp_types::EventId;
use tracing::trace;

use super::options::GlobalOptions;
use crate::utils;

#[derive(Debug, Args)]
#[command(about = "Show an event and its attendees. Read from the ledger when it is configured, \
                   from the index otherwise.")]
pub struct ShowArgs {
    #[arg(help = "Id of the event, as 0x-prefixed hex.")]
    pub event_id: EventId,
}

impl ShowArgs {
    pub async fn run(self, options: &GlobalOptions) -> Result<()> {
        trace!(args = ?self);

        let model = utils::view_model(options).await?;
        let view = model.focus(self.event_id).await?;
        let event = &view.event;

        println!("{}", event.name);
        if !event.description.is_empty() {
            println!("{}", event.description);
        }
        println!("id:        {}", event.id);
        println!("owner:     {}", event.owner);
        println!("starts:    {}", utils::format_time(event.timestamp));
        println!("deposit:   {} wei", event.deposit);
        println!(
            "capacity:  {}/{} registered, {} seats left",
            event.rsvp_count,
            event.capacity,
            event.seats_left()
        );
        println!("confirmed: {}", event.confirmed_count);
        if let Some(image) = &event.image_ref {
            println!("image:     {image}");
        }
        println!("paid out:  {}", if event.paid_out { "yes" } else { "no" });

        if let Some(attendees) = &view.attendees {
            println!();
            for rsvp in attendees {
                println!("  {}  {}", rsvp.attendee, utils::attendee_status(rsvp));
            }
        }

        println!();
        println!("({})", utils::freshness(&view));
        Ok(())
    }
}
