//! Command definitions and their execution against one engine instance.

use crate::display::{alarm_badge, arming_badge, sensor_table};
use anyhow::Context;
use catpoint_core::{
    ArmingStatus, CameraImage, ImageService, SecurityRepository, SecurityService, Sensor,
    SensorType,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// Engine as wired by the binary: storage and detector chosen at runtime.
pub type Engine = SecurityService<Box<dyn SecurityRepository>, Box<dyn ImageService>>;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show arming status, alarm status and sensors
    Status,
    /// Manage sensors
    Sensor {
        #[command(subcommand)]
        action: SensorAction,
    },
    /// Change the arming status
    Arm {
        #[arg(value_enum)]
        mode: ArmMode,
    },
    /// Run the cat detector on an image file
    Scan {
        /// Image file path
        image: PathBuf,
    },
    /// Read commands from stdin against a single engine
    Shell,
}

#[derive(Debug, Subcommand)]
pub enum SensorAction {
    /// Register a new, inactive sensor
    Add {
        /// Sensor name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Sensor type
        #[arg(long = "type", value_enum)]
        kind: SensorKind,
    },
    /// Remove a sensor
    Remove { id: Uuid },
    /// List sensors
    List,
    /// Mark a sensor as active
    Activate { id: Uuid },
    /// Mark a sensor as inactive
    Deactivate { id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArmMode {
    Disarmed,
    Home,
    Away,
}

impl From<ArmMode> for ArmingStatus {
    fn from(mode: ArmMode) -> Self {
        match mode {
            ArmMode::Disarmed => ArmingStatus::Disarmed,
            ArmMode::Home => ArmingStatus::ArmedHome,
            ArmMode::Away => ArmingStatus::ArmedAway,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SensorKind {
    Door,
    Window,
    Motion,
}

impl From<SensorKind> for SensorType {
    fn from(kind: SensorKind) -> Self {
        match kind {
            SensorKind::Door => SensorType::Door,
            SensorKind::Window => SensorType::Window,
            SensorKind::Motion => SensorType::Motion,
        }
    }
}

/// One line of shell input.
#[derive(Debug, Parser)]
#[command(name = "catpoint", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Runs a single command.
pub fn execute<W: Write>(
    engine: &mut Engine,
    command: Command,
    color: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    debug!(?command, "Executing command");

    match command {
        Command::Status => {
            writeln!(
                out,
                "Arming:  {}",
                arming_badge(engine.arming_status()).render(color)
            )?;
            writeln!(
                out,
                "Alarm:   {}",
                alarm_badge(engine.alarm_status()).render(color)
            )?;
            writeln!(
                out,
                "Cat:     {}",
                if engine.is_cat_detected() { "detected" } else { "none" }
            )?;
            write_sensors(&engine.sensors(), color, out)?;
        }
        Command::Sensor { action } => sensor_command(engine, action, color, out)?,
        Command::Arm { mode } => {
            engine.set_arming_status(mode.into())?;
            writeln!(
                out,
                "Arming:  {}",
                arming_badge(engine.arming_status()).render(color)
            )?;
        }
        Command::Scan { image } => {
            let frame = CameraImage::from_path(&image)?;
            let cat = engine.process_image(&frame)?;
            writeln!(
                out,
                "{}: {}",
                image.display(),
                if cat { "cat" } else { "no cat" }
            )?;
        }
        Command::Shell => anyhow::bail!("already in a shell"),
    }

    engine.repository().flush()?;
    Ok(())
}

fn sensor_command<W: Write>(
    engine: &mut Engine,
    action: SensorAction,
    color: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    match action {
        SensorAction::Add { name, kind } => {
            let sensor = Sensor::new(name.join(" "), kind.into());
            engine.add_sensor(&sensor)?;
            writeln!(out, "Added {} {}", sensor.id(), sensor.name)?;
        }
        SensorAction::Remove { id } => {
            let sensor = engine.sensor(id)?;
            engine.remove_sensor(&sensor)?;
            writeln!(out, "Removed {} {}", id, sensor.name)?;
        }
        SensorAction::List => write_sensors(&engine.sensors(), color, out)?,
        SensorAction::Activate { id } => {
            let sensor = engine.change_sensor_activation_by_id(id, true)?;
            writeln!(out, "{} is active", sensor.name)?;
        }
        SensorAction::Deactivate { id } => {
            let sensor = engine.change_sensor_activation_by_id(id, false)?;
            writeln!(out, "{} is inactive", sensor.name)?;
        }
    }
    Ok(())
}

fn write_sensors<W: Write>(sensors: &[Sensor], color: bool, out: &mut W) -> std::io::Result<()> {
    if sensors.is_empty() {
        return writeln!(out, "No sensors");
    }
    writeln!(out, "{}", sensor_table(sensors, color))
}

/// Reads commands line by line until EOF, `quit` or `exit`.
///
/// Parse and execution errors are reported and the loop continues.
pub fn run_shell<B: BufRead, W: Write>(
    engine: &mut Engine,
    input: B,
    color: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line.context("reading shell input")?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first() {
            None => continue,
            Some(&"quit") | Some(&"exit") => break,
            Some(_) => {}
        }

        match ShellLine::try_parse_from(words.iter().copied()) {
            Ok(ShellLine { command }) => {
                if let Err(e) = execute(engine, command, color, out) {
                    writeln!(out, "error: {:#}", e)?;
                }
            }
            Err(e) => write!(out, "{}", e)?,
        }
    }
    Ok(())
}
