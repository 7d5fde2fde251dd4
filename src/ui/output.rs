use crate::import::ImportReport;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().source.clone()),
        label.style(theme().label.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().label.clone()), value);
}

/// One line per import, followed by its row issues
pub fn import_report(report: &ImportReport) {
    let counts = format!(
        "{} imported, {} skipped, {} rejected",
        report.imported, report.skipped, report.rejected
    );
    if report.succeeded() {
        println!("{} {} {}", Icons::FILE, report.source.style(theme().source.clone()), counts);
    } else {
        error(&format!(
            "{}: {}",
            report.source,
            report.failure.as_deref().unwrap_or("import failed")
        ));
    }
    for issue in &report.issues {
        summary_row(&format!("line {}:", issue.line), &issue.detail.style(theme().detail.clone()).to_string());
    }
}
