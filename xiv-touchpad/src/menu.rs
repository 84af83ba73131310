use std::io::{self, BufRead, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use winapi::shared::windef::POINT;
use winapi::um::winuser::GetCursorPos;

use crate::camera::CameraResolver;
use crate::config::{Config, SPEED_MAX, SPEED_MIN};
use crate::diag;
use crate::hook;

pub struct ConfigMenu<'a> {
    pub config: Config,
    pub config_path: String,
    resolver: Option<&'a CameraResolver>,
}

impl<'a> ConfigMenu<'a> {
    pub fn new(config: Config, config_path: String, resolver: Option<&'a CameraResolver>) -> Self {
        Self {
            config,
            config_path,
            resolver,
        }
    }

    fn auto_save(&self) -> io::Result<()> {
        if let Err(e) = self.config.save(&self.config_path) {
            self.write_colored(Color::Red, &format!("✗ Auto-save failed: {}\n", e))?;
        } else {
            self.write_colored(Color::Green, "✓ Configuration auto-saved\n")?;
        }
        Ok(())
    }

    fn write_colored(&self, color: Color, text: &str) -> io::Result<()> {
        let mut stdout = StandardStream::stdout(ColorChoice::Always);
        stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(&mut stdout, "{}", text)?;
        stdout.reset()?;
        Ok(())
    }

    fn write_header(&self) -> io::Result<()> {
        self.write_colored(
            Color::Cyan,
            "\n╔══════════════════════════════════════════════════════════════╗\n",
        )?;
        self.write_colored(
            Color::Cyan,
            &format!("║{:^62}║\n", "Touchpad Camera Configuration"),
        )?;
        self.write_colored(
            Color::Cyan,
            "╚══════════════════════════════════════════════════════════════╝\n\n",
        )?;
        Ok(())
    }

    /// Returns false when the user chose to exit the mod entirely.
    pub fn show_main_menu(&mut self) -> io::Result<bool> {
        loop {
            self.write_header()?;

            let on_off = |v: bool| if v { "ON" } else { "OFF" };
            self.write_colored(Color::Yellow, "Current settings:\n")?;
            println!("  1. Yaw sensitivity    {:.3} rad/notch", self.config.speed_yaw);
            println!("  2. Pitch sensitivity  {:.3} rad/notch", self.config.speed_pitch);
            println!("  3. Invert yaw         {}", on_off(self.config.invert_yaw));
            println!("  4. Invert pitch       {}", on_off(self.config.invert_pitch));
            println!(
                "  5. Scroll camera      {}",
                if self.config.scroll_camera_enabled {
                    "ENABLED"
                } else {
                    "DISABLED"
                }
            );
            println!();
            self.write_colored(Color::Yellow, "Camera:\n")?;
            println!("  6. Show diagnostics");
            println!("  7. Nudge yaw  -0.1      8. Nudge yaw  +0.1");
            println!("  9. Nudge pitch +0.1     0. Nudge pitch -0.1");
            println!();
            println!("  S. Return to game        X. Exit mod");
            println!();

            match self.read_choice()?.as_str() {
                "1" => {
                    if let Some(value) = self.prompt_speed("yaw")? {
                        self.config.speed_yaw = value;
                        self.auto_save()?;
                    }
                }
                "2" => {
                    if let Some(value) = self.prompt_speed("pitch")? {
                        self.config.speed_pitch = value;
                        self.auto_save()?;
                    }
                }
                "3" => {
                    self.config.invert_yaw = !self.config.invert_yaw;
                    self.auto_save()?;
                }
                "4" => {
                    self.config.invert_pitch = !self.config.invert_pitch;
                    self.auto_save()?;
                }
                "5" => {
                    self.config.scroll_camera_enabled = !self.config.scroll_camera_enabled;
                    self.auto_save()?;
                }
                "6" => self.show_diagnostics()?,
                "7" => self.nudge(-0.1, 0.0)?,
                "8" => self.nudge(0.1, 0.0)?,
                "9" => self.nudge(0.0, 0.1)?,
                "0" => self.nudge(0.0, -0.1)?,
                "s" | "S" => return Ok(true),
                "x" | "X" => return Ok(false),
                other => {
                    self.write_colored(Color::Red, &format!("Unknown option '{}'\n", other))?;
                }
            }
        }
    }

    fn read_choice(&self) -> io::Result<String> {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn prompt_speed(&self, axis: &str) -> io::Result<Option<f32>> {
        print!(
            "New {} sensitivity ({:.2}-{:.2}, rad per wheel notch): ",
            axis, SPEED_MIN, SPEED_MAX
        );
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;

        match line.trim().parse::<f32>() {
            Ok(value) if (SPEED_MIN..=SPEED_MAX).contains(&value) => Ok(Some(value)),
            Ok(_) => {
                self.write_colored(
                    Color::Red,
                    &format!("Value must be between {} and {}\n", SPEED_MIN, SPEED_MAX),
                )?;
                Ok(None)
            }
            Err(_) => {
                self.write_colored(Color::Red, "Not a number\n")?;
                Ok(None)
            }
        }
    }

    fn show_diagnostics(&self) -> io::Result<()> {
        self.write_colored(Color::Yellow, "\nInput:\n")?;

        let mut cursor = POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut cursor) } != 0 {
            println!("  Cursor           ({}, {})", cursor.x, cursor.y);
        }

        let snap = diag::last_snapshot();
        println!(
            "  Wheel (last)     vertical {:+.2}  horizontal {:+.2} notches",
            snap.vertical, snap.horizontal
        );
        println!(
            "  Wheel hook       {}",
            if hook::is_installed() {
                "installed"
            } else {
                "NOT installed"
            }
        );

        self.write_colored(Color::Yellow, "Camera:\n")?;
        match self.resolver.and_then(|r| r.locate()) {
            Some(view) => {
                println!("  Block            {:#x}", view.as_ptr());
                println!("  Yaw (H)          {:+.3} rad", view.current_yaw());
                println!("  Pitch (V)        {:+.3} rad", view.current_pitch());
                let (min_pitch, max_pitch) = view.pitch_bounds();
                println!("  Pitch bounds     {:+.3} .. {:+.3}", min_pitch, max_pitch);
                let (min_zoom, max_zoom) = view.zoom_range();
                println!(
                    "  Zoom             {:.2} ({:.2} .. {:.2})",
                    view.current_zoom(),
                    min_zoom,
                    max_zoom
                );
                println!("  FoV              {:.3}", view.current_fov());
                println!(
                    "  Mode             {}",
                    match view.mode() {
                        0 => "first person".to_string(),
                        1 => "third person".to_string(),
                        other => format!("unknown ({})", other),
                    }
                );
            }
            None => {
                self.write_colored(Color::Red, "  Camera not available (not in-world?)\n")?;
            }
        }
        println!();
        Ok(())
    }

    fn nudge(&self, yaw: f32, pitch: f32) -> io::Result<()> {
        match self.resolver.and_then(|r| r.locate()) {
            Some(view) => {
                view.set_current_yaw(view.current_yaw() + yaw);
                view.set_current_pitch(view.current_pitch() + pitch);
                self.write_colored(
                    Color::Green,
                    &format!(
                        "✓ Camera now at yaw {:+.3}, pitch {:+.3}\n",
                        view.current_yaw(),
                        view.current_pitch()
                    ),
                )?;
            }
            None => {
                self.write_colored(Color::Red, "✗ Camera not available\n")?;
            }
        }
        Ok(())
    }
}
