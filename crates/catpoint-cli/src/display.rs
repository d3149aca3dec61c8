//! Console presentation: status labels, colours, the sensor table and the
//! event printer.

use catpoint_core::{AlarmStatus, ArmingStatus, Sensor, StatusListener};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};

/// Label and colour shown for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub rgb: (u8, u8, u8),
}

impl Badge {
    const fn new(label: &'static str, rgb: (u8, u8, u8)) -> Self {
        Self { label, rgb }
    }

    /// Nearest entry in the 6x6x6 cube of the 256-colour palette.
    pub fn color256(&self) -> u8 {
        let level = |c: u8| ((u16::from(c) * 5 + 127) / 255) as u8;
        let (r, g, b) = self.rgb;
        16 + 36 * level(r) + 6 * level(g) + level(b)
    }

    pub fn styled(&self) -> StyledObject<&'static str> {
        style(self.label).color256(self.color256()).bold()
    }

    /// Coloured when `color` is set, plain otherwise.
    pub fn render(&self, color: bool) -> String {
        self.styled().force_styling(color).to_string()
    }
}

pub fn alarm_badge(status: AlarmStatus) -> Badge {
    match status {
        AlarmStatus::NoAlarm => Badge::new("Cool and Good", (120, 200, 30)),
        AlarmStatus::PendingAlarm => Badge::new("I'm in Danger...", (200, 150, 20)),
        AlarmStatus::Alarm => Badge::new("Awooga!", (250, 80, 50)),
    }
}

pub fn arming_badge(status: ArmingStatus) -> Badge {
    match status {
        ArmingStatus::Disarmed => Badge::new("Disarmed", (120, 200, 30)),
        ArmingStatus::ArmedHome => Badge::new("Armed - At Home", (190, 180, 50)),
        ArmingStatus::ArmedAway => Badge::new("Armed - Away", (170, 30, 150)),
    }
}

/// Sensor listing, one row per sensor.
pub fn sensor_table(sensors: &[Sensor], color: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_NO_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if !color {
        table.force_no_tty();
    }

    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("State").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
    ]);

    for sensor in sensors {
        let state = if sensor.active {
            Cell::new("active").fg(Color::Red)
        } else {
            Cell::new("inactive").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(sensor.id()),
            Cell::new(sensor.sensor_type),
            state,
            Cell::new(&sensor.name),
        ]);
    }

    table
}

/// Prints every engine event to stdout.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleListener {
    color: bool,
}

impl ConsoleListener {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl StatusListener for ConsoleListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        println!("System Status: {}", alarm_badge(status).render(self.color));
    }

    fn on_cat_detected(&self, cat_detected: bool) {
        if cat_detected {
            println!(
                "Camera: {}",
                style("DANGER - CAT DETECTED").red().force_styling(self.color)
            );
        } else {
            println!("Camera: cats not detected");
        }
    }

    fn on_sensor_status_changed(&self) {
        println!("Sensors: all reset to inactive");
    }
}
