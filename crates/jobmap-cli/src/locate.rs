use clap::Subcommand;
use jobmap_core::Coordinate;
use jobmap_pipeline::JobMapSession;

/// Sub-commands available under `locate`.
#[derive(Debug, Subcommand)]
pub enum LocateCommands {
    /// Set the reference location used for distance, commute and routes
    Set {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Clear the reference location
    Clear,
    /// Show the reference location
    Show,
}

pub(crate) fn run_locate(session: &JobMapSession, command: LocateCommands) {
    match command {
        LocateCommands::Set { lat, lng } => {
            session.set_reference_location(Coordinate::new(lat, lng));
            println!("reference location set to {lat}, {lng}");
        }
        LocateCommands::Clear => {
            session.clear_reference_location();
            println!("reference location cleared");
        }
        LocateCommands::Show => match session.reference_location() {
            Some(c) => println!("{}, {}", c.lat, c.lng),
            None => println!("no reference location set"),
        },
    }
}
