//! Output formatting for CLI

use console::style;
use kino_sdk::{RendererKind, SelectionOverride, TracksSnapshot, WarmUpReport};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Pretty JSON for any serializable value
pub fn to_json<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// One row of the track listing
#[derive(Debug, Tabled)]
pub struct TrackRow {
    #[tabled(rename = "Unique ID")]
    pub unique_id: String,
    #[tabled(rename = "Kind")]
    pub kind: RendererKind,
    #[tabled(rename = "Bitrate")]
    pub bitrate: String,
    #[tabled(rename = "Resolution")]
    pub resolution: String,
    #[tabled(rename = "Language")]
    pub language: String,
    #[tabled(rename = "Auto")]
    pub adaptive: bool,
}

fn bitrate(bps: u64) -> String {
    if bps == 0 {
        "-".to_string()
    } else {
        format!("{} kbps", bps / 1000)
    }
}

/// Flatten a snapshot into display rows, video first
pub fn track_rows(snapshot: &TracksSnapshot) -> Vec<TrackRow> {
    let video = snapshot.video.iter().map(|t| TrackRow {
        unique_id: t.unique_id(),
        kind: RendererKind::Video,
        bitrate: bitrate(t.bitrate),
        resolution: if t.is_adaptive {
            "auto".to_string()
        } else {
            format!("{}x{}", t.width, t.height)
        },
        language: "-".to_string(),
        adaptive: t.is_adaptive,
    });
    let audio = snapshot.audio.iter().map(|t| TrackRow {
        unique_id: t.unique_id(),
        kind: RendererKind::Audio,
        bitrate: bitrate(t.bitrate),
        resolution: "-".to_string(),
        language: t.language.clone().unwrap_or_else(|| "-".to_string()),
        adaptive: t.is_adaptive,
    });
    let text = snapshot.text.iter().map(|t| TrackRow {
        unique_id: t.unique_id(),
        kind: RendererKind::Text,
        bitrate: "-".to_string(),
        resolution: "-".to_string(),
        language: t.language.clone().unwrap_or_else(|| "-".to_string()),
        adaptive: false,
    });
    video.chain(audio).chain(text).collect()
}

/// Render a snapshot in the requested format
pub fn render_snapshot(snapshot: &TracksSnapshot, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(snapshot),
        OutputFormat::Table => Ok(Table::new(track_rows(snapshot))
            .with(Style::rounded())
            .to_string()),
        OutputFormat::Text => {
            let mut out = format!(
                "{} (generation {})\n",
                style("Tracks").bold(),
                snapshot.generation
            );
            for row in track_rows(snapshot) {
                let marker = if row.adaptive { "*" } else { " " };
                out.push_str(&format!(
                    " {} {:<22} {:<6} {:>12} {:>10} {}\n",
                    marker, row.unique_id, row.kind, row.bitrate, row.resolution, row.language
                ));
            }
            out.push_str(&format!("\nTotal: {} tracks", snapshot.len()));
            Ok(out)
        }
    }
}

/// Serializable view of an applied override
#[derive(Debug, Serialize)]
pub struct SelectionView {
    pub unique_id: String,
    pub renderer: RendererKind,
    /// `None` when the renderer's overrides were cleared
    pub strategy: Option<&'static str>,
    pub group_index: Option<usize>,
    pub tracks: Vec<usize>,
}

impl SelectionView {
    pub fn new(
        unique_id: &str,
        renderer: RendererKind,
        selection: Option<&SelectionOverride>,
    ) -> Self {
        Self {
            unique_id: unique_id.to_string(),
            renderer,
            strategy: selection.map(|s| s.factory.name()),
            group_index: selection.map(|s| s.group_index),
            tracks: selection.map(|s| s.tracks.clone()).unwrap_or_default(),
        }
    }
}

pub fn render_selection(view: &SelectionView, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(view),
        OutputFormat::Table | OutputFormat::Text => Ok(match (view.strategy, view.group_index) {
            (Some(strategy), Some(group)) => format!(
                "{} {} -> {} override on group {} tracks {:?}",
                style("OK").green().bold(),
                view.unique_id,
                strategy,
                group,
                view.tracks
            ),
            _ => format!(
                "{} {} -> {} overrides cleared",
                style("OK").yellow().bold(),
                view.unique_id,
                view.renderer
            ),
        }),
    }
}

pub fn render_report(report: &WarmUpReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Table | OutputFormat::Text => Ok(format!(
            "Warm-up: {} attempted, {} succeeded, {} failed, {} timed out",
            report.attempted,
            style(report.succeeded).green(),
            style(report.failed).red(),
            style(report.timed_out).yellow()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kino_sdk::{TrackId, VideoTrackInfo};

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_track_rows() {
        let mut snapshot = TracksSnapshot::new(1);
        snapshot.video.push(VideoTrackInfo {
            id: TrackId::adaptive(RendererKind::Video, 0),
            bitrate: 0,
            width: 0,
            height: 0,
            is_adaptive: true,
        });
        snapshot.video.push(VideoTrackInfo {
            id: TrackId::track(RendererKind::Video, 0, 0),
            bitrate: 2_800_000,
            width: 1280,
            height: 720,
            is_adaptive: false,
        });

        let rows = track_rows(&snapshot);
        assert_eq!(rows[0].resolution, "auto");
        assert_eq!(rows[1].resolution, "1280x720");
        assert_eq!(rows[1].bitrate, "2800 kbps");

        let table = render_snapshot(&snapshot, OutputFormat::Table).unwrap();
        assert!(table.contains("Video:0,0,adaptive"));
    }

    #[test]
    fn test_cleared_selection_view() {
        let view = SelectionView::new("Video:0,1,adaptive", RendererKind::Video, None);
        let json: serde_json::Value = serde_json::from_str(&to_json(&view).unwrap()).unwrap();
        assert!(json["strategy"].is_null());
        assert_eq!(json["renderer"], "video");
    }
}
