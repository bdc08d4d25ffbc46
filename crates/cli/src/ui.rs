//! Terminal rendering: notifications, spinners, the instance table and
//! the onboarding prompts.

use std::time::Duration;

use console::style;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use gateway::models::Instance;
use indicatif::{ProgressBar, ProgressStyle};
use services::services::{
    directory::{RowStyle, status_style},
    onboarding::{Banner, BannerStyle, InstanceDraft, ValidationError},
};
use utils::msg::{Notification, Notifier, Severity};

/// Notifier that renders to the terminal, colored by severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => println!("{}", style(notification.text).green()),
            Severity::Error => eprintln!("{}", style(notification.text).red()),
            Severity::Info => println!("{}", notification.text),
        }
    }
}

/// Busy affordance shown while a request is in flight.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn print_banner(banner: &Banner) {
    match banner.style {
        BannerStyle::Success => println!("{}", style(&banner.text).green()),
        BannerStyle::Danger => println!("{}", style(&banner.text).red()),
    }
}

/// Render validation failures next to their field labels.
pub fn print_field_errors(errors: &ValidationError) {
    for error in errors.fields() {
        eprintln!(
            "{}: {}",
            style(error.field.label()).bold(),
            style(&error.message).red()
        );
    }
}

pub fn print_instance_table(rows: &[Instance]) {
    if rows.is_empty() {
        println!("No instances configured.");
        return;
    }
    println!(
        "{:<5} {:<20} {:<32} {:<10} {:<20}",
        style("ID").bold(),
        style("NAME").bold(),
        style("URL").bold(),
        style("STATUS").bold(),
        style("LAST CHECKED").bold()
    );
    for row in rows {
        let status = row.status.to_string();
        let status = match status_style(row.status) {
            RowStyle::Success => style(status).green(),
            RowStyle::Error => style(status).red(),
            RowStyle::Neutral => style(status).dim(),
        };
        println!(
            "{:<5} {:<20} {:<32} {:<10} {:<20}",
            row.id,
            row.name,
            row.url,
            status,
            row.last_checked_local().unwrap_or_else(|| "-".to_string())
        );
    }
}

/// Prompt for the three onboarding fields, pre-filled with any values
/// from a previous round so a failed submission loses nothing.
pub fn prompt_draft(previous: &InstanceDraft) -> anyhow::Result<InstanceDraft> {
    let theme = ColorfulTheme::default();
    let name: String = Input::with_theme(&theme)
        .with_prompt("Instance Name")
        .with_initial_text(previous.name.clone())
        .allow_empty(true)
        .interact_text()?;
    let url: String = Input::with_theme(&theme)
        .with_prompt("Sonarr URL")
        .with_initial_text(previous.url.clone())
        .allow_empty(true)
        .interact_text()?;
    let api_key = Password::with_theme(&theme)
        .with_prompt(if previous.api_key.is_empty() {
            "API Key"
        } else {
            "API Key (leave empty to keep the entered one)"
        })
        .allow_empty_password(true)
        .interact()?;
    let api_key = if api_key.is_empty() {
        previous.api_key.clone()
    } else {
        api_key
    };
    Ok(InstanceDraft { name, url, api_key })
}

pub fn prompt_credentials() -> anyhow::Result<(String, String)> {
    let theme = ColorfulTheme::default();
    let email: String = Input::with_theme(&theme)
        .with_prompt("Email")
        .interact_text()?;
    let password = Password::with_theme(&theme)
        .with_prompt("Password")
        .interact()?;
    Ok((email, password))
}
