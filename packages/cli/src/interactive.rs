//! Prompts for the run parameters when no flags were given.

use crash_map_ingest_models::RunParameters;
use dialoguer::{Confirm, Input};

/// Asks for the reference year and window, pre-filled with `defaults`.
///
/// # Errors
///
/// Returns [`dialoguer::Error`] if the terminal cannot be read.
pub fn prompt_parameters(defaults: RunParameters) -> Result<RunParameters, dialoguer::Error> {
    println!("Crash Map");
    println!();

    loop {
        let reference_year: i32 = Input::new()
            .with_prompt("Most recent crash year")
            .default(defaults.reference_year)
            .interact_text()?;

        let window: u32 = Input::new()
            .with_prompt("Earlier years to include")
            .default(defaults.window)
            .interact_text()?;

        let params = RunParameters {
            reference_year,
            window,
        };

        if Confirm::new()
            .with_prompt(format!(
                "Prepare collisions from {} through {reference_year}?",
                params.first_year()
            ))
            .default(true)
            .interact()?
        {
            return Ok(params);
        }
    }
}
