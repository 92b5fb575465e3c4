//! Human-readable error descriptions and structured JSON error formatting.

use longplan_core::error::{BuildError, PlannerError};
use longplan_sim::SimError;

/// Stable process exit codes; clap keeps 2 for usage errors.
pub mod exit {
    pub const GENERIC: i32 = 1;
    pub const CONFIG: i32 = 3;
    pub const DRIVE_LOG: i32 = 4;
    pub const BUILD: i32 = 5;
    pub const PLANNER: i32 = 6;
    pub const SIM: i32 = 7;
}

fn has_context(err: &eyre::Report, prefix: &str) -> bool {
    err.chain().any(|c| c.to_string().starts_with(prefix))
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSolver => {
                "What happened: No solver was provided to the planner.\nLikely causes: The solver was not wired into the builder.\nHow to fix: Pass a solver via with_solver(...) before build().".to_string()
            }
            BuildError::MissingVehicle => {
                "What happened: No vehicle parameters were provided to the planner.\nLikely causes: The [vehicle] section was not mapped into the builder.\nHow to fix: Pass vehicle parameters via with_vehicle(...) before build().".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid planner configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<PlannerError>() {
        return match pe {
            PlannerError::Solver(msg) => format!(
                "What happened: The solver failed during a planning cycle ({msg}).\nLikely causes: Infeasible acceleration bounds or non-finite inputs reaching the solver.\nHow to fix: Re-run with --log-level=debug to see the bounds handed to the solver."
            ),
            PlannerError::SolverOutput { field, expected, got } => format!(
                "What happened: The solver returned {got} samples for `{field}` instead of {expected}.\nLikely causes: A solver built for a different horizon.\nHow to fix: Use a solver on the 13-point planning grid."
            ),
            PlannerError::State(msg) => format!(
                "What happened: The planner rejected its inputs ({msg}).\nLikely causes: NaN or infinite speed, acceleration or set-speed in the drive log.\nHow to fix: Clean the offending rows and rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SimError>() {
        return match se {
            SimError::InvalidScenario(msg) => format!(
                "What happened: The simulation scenario is invalid ({msg}).\nLikely causes: Bad values in the [sim] section.\nHow to fix: Check duration_s, v_init_mps and the lead's starting gap."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if err.downcast_ref::<toml::de::Error>().is_some() || lower.starts_with("invalid configuration")
    {
        let cause = err.root_cause();
        return format!(
            "What happened: Configuration is invalid ({cause}).\nLikely causes: A typo in a key or an out-of-range value.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Drive log header special-case
    if has_context(err, "invalid drive log") {
        let cause = err.root_cause().to_string();
        if cause.contains("must have headers") {
            return format!("Invalid headers in drive log CSV. {cause}");
        }
        return format!(
            "What happened: The drive log could not be used ({cause}).\nLikely causes: Missing columns, unparsable values or timestamps out of order.\nHow to fix: Fix the CSV and rerun."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return exit::BUILD;
    }
    if err.downcast_ref::<PlannerError>().is_some() {
        return exit::PLANNER;
    }
    if err.downcast_ref::<SimError>().is_some() {
        return exit::SIM;
    }
    if err.downcast_ref::<toml::de::Error>().is_some() || has_context(err, "invalid configuration")
    {
        return exit::CONFIG;
    }
    if has_context(err, "invalid drive log") {
        return exit::DRIVE_LOG;
    }
    exit::GENERIC
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        exit::CONFIG => "Config",
        exit::DRIVE_LOG => "DriveLog",
        exit::BUILD => "Build",
        exit::PLANNER => match err.downcast_ref::<PlannerError>() {
            Some(PlannerError::Solver(_)) => "Solver",
            Some(PlannerError::SolverOutput { .. }) => "SolverOutput",
            Some(PlannerError::State(_)) | None => "State",
        },
        exit::SIM => "Sim",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let context: Vec<String> = err.chain().map(ToString::to_string).collect();
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
        "context": context,
    })
    .to_string()
}
