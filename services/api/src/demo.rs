use crate::infra::{
    InMemoryContacts, InMemoryDirectory, InMemoryScheduling, DEMO_GROUP, DEMO_STUDY,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::sync::Arc;
use volunteer_desk::config::MatchingSettings;
use volunteer_desk::error::AppError;
use volunteer_desk::workflows::matching::{
    DemographicFilters, Filters, MakeupSelection, MatchReport, MatchingService, ScoringConfig,
};
use volunteer_desk::workflows::scheduling::{
    AppointmentId, AssignmentOutcome, AssignmentRequest, AssignmentService, DaySchedule,
};
use volunteer_desk::workflows::volunteers::VolunteerId;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Minimum age in completed years
    #[arg(long, default_value_t = 18)]
    pub(crate) age_min: u32,
    /// Maximum age in completed years
    #[arg(long, default_value_t = 65)]
    pub(crate) age_max: u32,
    /// Accepted phototype (repeatable, digits or Roman numerals)
    #[arg(long = "phototype")]
    pub(crate) phototypes: Vec<String>,
    /// Makeup product labels the volunteers should use (repeatable)
    #[arg(long = "makeup")]
    pub(crate) makeup: Vec<String>,
    /// Reference date for ages (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the appointment assignment portion of the demo.
    #[arg(long)]
    pub(crate) skip_assignment: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        age_min,
        age_max,
        phototypes,
        makeup,
        today,
        skip_assignment,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let directory = Arc::new(InMemoryDirectory::seeded());
    let matching = MatchingService::new(
        directory.clone(),
        Arc::new(InMemoryContacts::default()),
        MatchingSettings::default(),
        ScoringConfig::default(),
    );

    let filters = Filters {
        demographics: DemographicFilters {
            age_min,
            age_max,
            phototypes,
            ..DemographicFilters::default()
        },
        makeup: MakeupSelection {
            face: makeup,
            ..MakeupSelection::default()
        },
        ..Filters::default()
    };

    println!("=== Matching ({today}) ===");
    let best = match matching.execute(&filters, today).await {
        Ok(report) => {
            render_match_report(&report);
            report.results.first().map(|result| result.volunteer_id)
        }
        Err(error) => {
            println!("Matching failed: {error}");
            None
        }
    };

    if skip_assignment {
        return Ok(());
    }

    println!();
    println!("=== Assignment (study {DEMO_STUDY}) ===");
    let Some(volunteer_id) = best else {
        println!("No volunteer to assign.");
        return Ok(());
    };

    let scheduling = AssignmentService::new(Arc::new(InMemoryScheduling::seeded()), directory);
    run_assignment(&scheduling, volunteer_id).await;
    Ok(())
}

async fn run_assignment(
    scheduling: &AssignmentService<InMemoryScheduling, InMemoryDirectory>,
    volunteer_id: VolunteerId,
) {
    let request = AssignmentRequest {
        study_id: DEMO_STUDY,
        appointment_id: AppointmentId(5),
        volunteer_id,
        group_id: DEMO_GROUP,
        confirmed: false,
    };

    let outcome = match scheduling.assign(request.clone()).await {
        Ok(AssignmentOutcome::RequiresConfirmation { reason }) => {
            println!("Confirmation required ({reason}); proceeding with operator override.");
            scheduling
                .assign(AssignmentRequest {
                    confirmed: true,
                    ..request
                })
                .await
        }
        other => other,
    };

    match outcome {
        Ok(AssignmentOutcome::Assigned(receipt)) => {
            println!(
                "Volunteer {volunteer_id} assigned to appointment {} (association created: {}).",
                receipt.appointment.id, receipt.association_created
            );
            for warning in &receipt.warnings {
                println!("  warning: {}", warning.message);
            }
        }
        Ok(AssignmentOutcome::RequiresConfirmation { reason }) => {
            println!("Assignment still awaits confirmation: {reason}");
        }
        Err(error) => {
            println!("Assignment failed: {error}");
            return;
        }
    }

    match scheduling.roster(DEMO_STUDY).await {
        Ok(roster) => {
            for association in roster {
                let group = association
                    .group_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "Enrolled volunteer {} in group {group} with incentive {}.",
                    association.volunteer_id, association.incentive
                );
            }
        }
        Err(error) => println!("Roster unavailable: {error}"),
    }

    match scheduling.schedule(DEMO_STUDY).await {
        Ok(days) => render_schedule(&days),
        Err(error) => println!("Schedule unavailable: {error}"),
    }
}

fn render_match_report(report: &MatchReport) {
    println!(
        "Considered {} volunteers, {} matched, {} excluded.",
        report.considered,
        report.results.len(),
        report.exclusions.total()
    );
    for result in &report.results {
        let phototype = result
            .phototype
            .map(|phototype| phototype.roman())
            .unwrap_or("-");
        println!(
            "- #{} {} (age {}, phototype {}) score {}",
            result.volunteer_id, result.display_name, result.age, phototype, result.total_score
        );
    }
    if let Some(average) = report.statistics.average_score {
        println!(
            "Average score {average:.1}: {} excellent, {} good, {} fair.",
            report.statistics.excellent, report.statistics.good, report.statistics.fair
        );
    }
}

fn render_schedule(days: &[DaySchedule]) {
    println!("Schedule:");
    for day in days {
        let date = day
            .date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "unscheduled".to_string());
        println!("  {date} ({} appointments)", day.appointment_count());
        for slot in &day.slots {
            let time = slot.time.as_deref().unwrap_or("--:--");
            for appointment in &slot.appointments {
                let holder = appointment
                    .volunteer_id
                    .map(|id| format!("volunteer {id}"))
                    .unwrap_or_else(|| "free".to_string());
                println!("    {time} #{} {holder}", appointment.id);
            }
        }
    }
}
