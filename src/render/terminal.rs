use colored::Colorize;

use super::{
    CreatedUserView, DomainRow, HealthView, MetricsView, Notice, NoticeKind, Renderer, UserRow,
    truncate,
};
use crate::api::HealthStatus;

/// Renderer that prints to the terminal.
///
/// Notices go to stderr so that tables on stdout stay pipeable.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for TerminalRenderer {
    fn login(&mut self, error: Option<&str>) {
        match error {
            Some(msg) => eprintln!("{} {}", "✗".red().bold(), msg.red()),
            None => eprintln!(
                "{}",
                "No active session. Run `smartsni-panel login` to sign in.".yellow()
            ),
        }
    }

    fn dashboard(&mut self, username: &str) {
        println!(
            "{} {}",
            "SmartSNI Panel".bold().cyan(),
            format!("signed in as {username}").dimmed()
        );
        println!("{}", "=".repeat(60));
    }

    fn metrics(&mut self, view: &MetricsView) {
        println!("{}", "Metrics".bold().cyan());
        println!("  {:<18} {}", "DoH queries:".bold(), view.doh_queries);
        println!("  {:<18} {}", "DoT queries:".bold(), view.dot_queries);
        println!("  {:<18} {}", "SNI connections:".bold(), view.sni_connections);
        println!("  {:<18} {}", "Cache hit rate:".bold(), view.cache_hit_rate);
        println!();
    }

    fn health(&mut self, view: &HealthView) {
        let status = match view.status {
            HealthStatus::Healthy => view.status_text.green().bold(),
            HealthStatus::Unhealthy => view.status_text.red().bold(),
        };
        println!("{}", "System".bold().cyan());
        println!("  {:<18} {}", "Status:".bold(), status);
        println!("  {:<18} {}", "Version:".bold(), view.version);
        println!("  {:<18} {}", "Uptime:".bold(), view.uptime);
        println!();
    }

    fn domains(&mut self, rows: &[DomainRow]) {
        println!("{}", "Domains".bold().cyan());
        if rows.is_empty() {
            println!("  {}", "No domains configured".dimmed());
            println!();
            return;
        }

        println!("  {:<40} IP", "Domain");
        println!("  {}", "-".repeat(58));
        for (i, row) in rows.iter().enumerate() {
            let line = format!("  {:<40} {}", truncate(&row.domain, 40), row.ip);
            if i % 2 == 0 {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
        println!();
    }

    fn users(&mut self, rows: &[UserRow]) {
        println!("{}", "Users".bold().cyan());
        if rows.is_empty() {
            println!("  {}", "No users registered yet".dimmed());
            println!();
            return;
        }

        println!(
            "  {:<18} {:<9} {:<10} {:<10} {:>8}  ID",
            "Name", "IPs", "Expires", "Status", "Usage"
        );
        println!("  {}", "-".repeat(78));
        for row in rows {
            let status = if row.active {
                row.status_text().green()
            } else {
                row.status_text().red()
            };
            println!(
                "  {:<18} {:<9} {:<10} {:<10} {:>8}  {}",
                truncate(&row.name, 18),
                row.ip_count,
                row.expires,
                status,
                row.usage_count,
                row.id.dimmed(),
            );
            if let Some(ref description) = row.description {
                println!("    {}", description.dimmed());
            }
            for ip in &row.ips {
                println!("    {} {}", "·".dimmed(), ip);
            }
            println!("    {} {}", "link:".dimmed(), row.register_link);
        }
        println!();
    }

    fn user_created(&mut self, view: &CreatedUserView) {
        println!("{} User created", "✓".green().bold());
        println!("  {:<14} {}", "Name:".bold(), view.name);
        println!("  {:<14} {}", "Max IPs:".bold(), view.max_ips);
        println!("  {:<14} {}", "Valid days:".bold(), view.valid_days);
        println!("  {:<14} {}", "Expires:".bold(), view.expires);
        println!("  {:<14} {}", "Register link:".bold(), view.register_link);
    }

    fn notice(&mut self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Success => eprintln!("{} {}", "✓".green().bold(), notice.message),
            NoticeKind::Info => eprintln!("{} {}", "·".dimmed(), notice.message),
            NoticeKind::Error => eprintln!("{} {}", "✗".red().bold(), notice.message.red()),
        }
    }
}
