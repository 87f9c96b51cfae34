//! Text rendering of day timelines

use std::fmt::Write;

use dayline_core::time::minutes_to_time;
use dayline_core::{AgendaDay, TaskRecord, Timeline};
use nu_ansi_term::{Color, Style};

/// Parse `#RRGGBB`, falling back to white
fn swatch(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 {
        return Color::White;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}

/// `Wed 2025-09-17 (today)`
pub fn day_header(day: &AgendaDay<'_>) -> String {
    let label = format!("{} {}", day.date.format("%a"), day.date);
    if day.is_today {
        format!("{} {}", Color::Cyan.bold().paint(label), Color::Cyan.paint("(today)"))
    } else {
        Style::new().bold().paint(label).to_string()
    }
}

/// One task as `09:00-10:00 ■ 🍎 Title  [id]`
pub fn task_line(task: &TaskRecord) -> String {
    let mut title = String::new();
    if let Some(emoji) = task.emoji.as_deref() {
        title.push_str(emoji);
        title.push(' ');
    }
    title.push_str(task.display_title());

    let title = if task.done {
        Style::new().strikethrough().dimmed().paint(title).to_string()
    } else {
        title
    };
    let recurring = if task.weekly { " ↻" } else { "" };

    format!(
        "{}-{} {} {}{}  {}",
        task.start,
        task.end,
        swatch(&task.color).paint("■"),
        title,
        recurring,
        Style::new().dimmed().paint(short_id(&task.id)),
    )
}

/// First eight characters of a task id
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Minutes since midnight of a marker offset
fn marker_minutes(timeline: &Timeline<'_>, offset: f64) -> u32 {
    let minutes = f64::from(timeline.start_hour * 60) + offset / timeline.hour_height * 60.0;
    minutes.round().max(0.0) as u32
}

/// Full hour grid of one day with the now marker
pub fn render_day(day: &AgendaDay<'_>) -> String {
    let timeline = &day.timeline;
    let mut out = String::new();
    let _ = writeln!(out, "{}", day_header(day));

    let now = timeline.now_offset.map(|o| marker_minutes(timeline, o));
    let rule = Style::new().dimmed().paint("│");

    for &hour in &timeline.hours {
        let _ = writeln!(out, "{:02}:00 {}", hour, rule);

        for item in &timeline.items {
            if item.occurrence.task.start_minutes().map(|m| m / 60) == Some(hour) {
                let _ = writeln!(out, "      {} {}", rule, task_line(item.occurrence.task));
            }
        }

        if let Some(now) = now.filter(|m| m / 60 == hour) {
            let _ = writeln!(
                out,
                "      {}",
                Color::Red.bold().paint(format!("── now {} ──", minutes_to_time(now)))
            );
        }
    }

    // Unparseable times have no place on the grid
    for item in timeline.items.iter().filter(|i| i.top.is_nan()) {
        let _ = writeln!(out, "--:-- {} {}", rule, task_line(item.occurrence.task));
    }

    out
}

/// Header plus one line per occurrence
pub fn render_summary(day: &AgendaDay<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", day_header(day));

    if day.timeline.items.is_empty() {
        let _ = writeln!(out, "  {}", Style::new().dimmed().paint("nothing planned"));
    }
    for item in &day.timeline.items {
        let _ = writeln!(out, "  {}", task_line(item.occurrence.task));
    }

    out
}
