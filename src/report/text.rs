use super::json::{ErrorReport, SearchResult, Status};
use crate::chart::ChartTemplates;
use crate::debugger::{Progress, SearchMode, SearchStep};
use crate::parser::{DecomposeMode, UnitKind};
use colored::Colorize;

/// Human-readable terminal output. Progress arrives while the search runs;
/// the result section is printed once at the end.
pub struct TextReporter {
    verbose: bool,
}

impl TextReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn header(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "-".repeat(50).dimmed());
    }

    pub fn print_result(&self, result: &SearchResult) {
        match result.status {
            Status::Success => {
                self.header("Result");
                println!("  {}", "OK Helm template renders without errors".green());
            }
            Status::Error => {
                let message = result.tool_error().unwrap_or("unknown error");
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            Status::Failure => {
                if let Some(report) = result.fault() {
                    self.print_fault(report);
                }
                self.print_suggestions(&result.suggestions);
            }
        }
    }

    fn print_fault(&self, report: &ErrorReport) {
        self.header("Error Found");

        let location = match (&report.file, report.line) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            (Some(file), None) => file.clone(),
            _ => "unknown location".to_string(),
        };
        println!("  {} {}", "Location:".bold(), location.yellow());
        if let Some(block_type) = &report.block_type {
            let index = report
                .block_index
                .map(|i| format!(" #{}", i))
                .unwrap_or_default();
            println!("  {} {}{}", "Block:".bold(), block_type, index);
        }
        println!(
            "  {} {} (risk: {})",
            "Category:".bold(),
            report.category.as_str(),
            report.risk.as_str()
        );

        if !report.failing_lines.is_empty() {
            println!();
            for l in &report.context_before {
                println!("  {}", format!("{:>4} | {}", l.line, l.content).dimmed());
            }
            for l in &report.failing_lines {
                println!("  {}", format!("{:>4} > {}", l.line, l.content).red().bold());
            }
            for l in &report.context_after {
                println!("  {}", format!("{:>4} | {}", l.line, l.content).dimmed());
            }
        }

        if !report.helm_error.is_empty() {
            println!("\n  {}", "Helm error:".bold());
            for line in report.helm_error.lines() {
                println!("    {}", line.red());
            }
        }

        if !report.rendered_manifest_tail.is_empty() {
            println!("\n  {}", "Last successful render (tail):".bold());
            for l in &report.rendered_manifest_tail {
                println!("  {}", format!("{:>4} | {}", l.line, l.content).dimmed());
            }
        }
    }

    fn print_suggestions(&self, suggestions: &[String]) {
        if suggestions.is_empty() {
            return;
        }
        self.header("Suggestions");
        for s in suggestions {
            println!("  - {}", s);
        }
    }
}

impl Progress for TextReporter {
    fn chart_parsed(&mut self, chart: &ChartTemplates) {
        self.header("Chart Analysis");
        println!("  Chart path:     {}", chart.chart_path.display());
        println!("  Template files: {}", chart.total_files());
        println!("  Total blocks:   {}", chart.total_blocks());

        if self.verbose {
            println!("\n  {}", "Files:".dimmed());
            for t in &chart.templates {
                println!("    - {}: {} blocks", t.template_name(), t.block_count());
            }
        }
    }

    fn mode_selected(&mut self, mode: SearchMode, decompose: DecomposeMode) {
        let unit = match decompose {
            DecomposeMode::Line => "lines",
            DecomposeMode::Block => "blocks",
        };
        println!("\n{}", format!("[{} Mode, {}]", mode.title(), unit).bold());
    }

    fn step(&mut self, step: &SearchStep) {
        let status = if step.passed {
            "OK".green()
        } else {
            "FAIL".red()
        };
        let unit = match step.unit_type {
            UnitKind::Line => "lines",
            UnitKind::Block => "blocks",
        };
        println!(
            "  [{}] Testing {} {}... {}",
            step.file, unit, step.range_tested, status
        );
    }

    fn info(&mut self, message: &str) {
        if self.verbose {
            println!("{} {}", "info:".blue(), message);
        }
    }

    fn warning(&mut self, message: &str) {
        eprintln!("{} {}", "warning:".yellow(), message);
    }
}
