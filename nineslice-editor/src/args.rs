use clap::{Args, Parser, Subcommand};
use nineslice::EditorSettings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Nine-slice margin editor and previewer", long_about = None)]
pub struct Cli {
    /// Source image. A generated 800x600 frame is used when omitted.
    #[arg(long, global = true)]
    pub image: Option<PathBuf>,

    /// JSON preset with margins, output size, position and vertex tints.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, global = true, env = "NINESLICE_LOG", default_value = "info")]
    pub log_level: log::LevelFilter,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Per-field overrides applied on top of the preset.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Left breakpoint in source pixels.
    #[arg(long, global = true)]
    pub left: Option<u32>,
    /// Right breakpoint in source pixels.
    #[arg(long, global = true)]
    pub right: Option<u32>,
    /// Top breakpoint in source pixels.
    #[arg(long, global = true)]
    pub top: Option<u32>,
    /// Bottom breakpoint in source pixels.
    #[arg(long, global = true)]
    pub bottom: Option<u32>,
    /// Output width in pixels.
    #[arg(long, global = true)]
    pub width: Option<f32>,
    /// Output height in pixels.
    #[arg(long, global = true)]
    pub height: Option<f32>,
    /// Output x position of the top-left corner.
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub x: Option<f32>,
    /// Output y position of the top-left corner.
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub y: Option<f32>,
}

impl Overrides {
    pub fn apply(&self, settings: &mut EditorSettings) {
        let m = &mut settings.margins;
        m.left = self.left.unwrap_or(m.left);
        m.right = self.right.unwrap_or(m.right);
        m.top = self.top.unwrap_or(m.top);
        m.bottom = self.bottom.unwrap_or(m.bottom);

        settings.size[0] = self.width.unwrap_or(settings.size[0]);
        settings.size[1] = self.height.unwrap_or(settings.size[1]);
        settings.position[0] = self.x.unwrap_or(settings.position[0]);
        settings.position[1] = self.y.unwrap_or(settings.position[1]);
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Open the interactive editor window (default)
    Window,
    /// Render the preview on the CPU and save it as a PNG
    Snapshot {
        /// Output PNG path
        #[arg(short, long, default_value = "nineslice.png")]
        output: PathBuf,
        /// Canvas width; defaults to the mesh extent
        #[arg(long)]
        canvas_width: Option<u32>,
        /// Canvas height; defaults to the mesh extent
        #[arg(long)]
        canvas_height: Option<u32>,
    },
    /// Print the exported vertex and index buffers as JSON
    Dump {
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_selectively() {
        let cli = Cli::parse_from([
            "nineslice-editor",
            "--left",
            "20",
            "--width",
            "640",
            "--x",
            "-15",
            "dump",
        ]);
        let mut settings = EditorSettings::default();
        cli.overrides.apply(&mut settings);

        assert_eq!(settings.margins.left, 20);
        assert_eq!(settings.margins.right, 454);
        assert_eq!(settings.size, [640.0, 500.0]);
        assert_eq!(settings.position, [-15.0, 0.0]);
        assert_eq!(cli.command, Some(Commands::Dump { pretty: false }));
    }

    #[test]
    fn test_log_level_is_parsed() {
        let cli = Cli::parse_from(["nineslice-editor", "--log-level", "debug", "dump"]);
        assert_eq!(cli.log_level, log::LevelFilter::Debug);

        let bad = Cli::try_parse_from(["nineslice-editor", "--log-level", "loud", "dump"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["nineslice-editor"]);
        assert!(cli.command.is_none());
        assert!(cli.image.is_none());
    }
}
