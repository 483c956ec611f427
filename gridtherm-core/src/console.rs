//! Operator console
//!
//! Executes parsed [`Command`]s against the scheduler and writes a
//! human-readable reply. Failures are reported as text; nothing here is
//! fatal to the loop.

use core::fmt::{self, Write};

use log::{info, warn};

use gridtherm_hal::{Clock, Connectivity, DeviceIdentity, KeyValueStore, SensorBus, Transport};
use gridtherm_protocol::{Command, CommandError};

use crate::calibration::{calibrate, CalibrationError, CalibrationTable};
use crate::config::Settings;
use crate::mapping::Mapping;
use crate::scheduler::Scheduler;
use crate::state::{Event, Mode};
use crate::store::{clear_calibration, clear_mapping, persist_calibration, save_settings};

/// Reply to `HELP`
pub const HELP: &str = "\
Commands:
  HELP                       this list
  SHOW                       mapping, calibration and settings
  CALIBRATE                  equalize sensors at a common ambient temperature
  RESET CAL                  clear calibration
  RESET                      clear mapping and calibration, relearn
  SET WIFI <ssid> [<pass>]   network credentials
  SET SERVER <url>           telemetry endpoint
  SET INTERVAL <seconds>     reporting period (min 10)
";

impl<B, T, N, S, I, K> Scheduler<B, T, N, S, I, K>
where
    B: SensorBus,
    T: Transport,
    N: Connectivity,
    S: KeyValueStore,
    I: DeviceIdentity,
    K: Clock,
{
    /// Parse and execute one console line
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> fmt::Result {
        match Command::parse(line) {
            Ok(command) => self.execute(command, out),
            Err(CommandError::Empty) => Ok(()),
            Err(e) => writeln!(out, "ERROR: {}", e),
        }
    }

    /// Execute one command
    pub fn execute<W: Write>(&mut self, command: Command<'_>, out: &mut W) -> fmt::Result {
        match command {
            Command::Help => out.write_str(HELP),
            Command::Show => self.show(out),
            Command::Calibrate => self.run_calibration(out),
            Command::ResetCalibration => self.reset_calibration(out),
            Command::Reset => self.reset_all(out),
            Command::SetWifi { ssid, password } => {
                let mut settings = self.runtime.settings.clone();
                if let Err(e) = settings.network.set_wifi(ssid, password) {
                    return writeln!(out, "ERROR: {}", e);
                }
                self.commit_settings(settings, out)?;
                self.reconnect();
                writeln!(out, "WiFi set to {}, reconnecting", ssid)
            }
            Command::SetServer { url } => {
                let mut settings = self.runtime.settings.clone();
                if let Err(e) = settings.network.set_server(url) {
                    return writeln!(out, "ERROR: {}", e);
                }
                self.commit_settings(settings, out)?;
                writeln!(out, "Server set to {}", url)
            }
            Command::SetInterval { seconds } => {
                let mut settings = self.runtime.settings.clone();
                if let Err(e) = settings.set_interval(seconds) {
                    return writeln!(out, "ERROR: {}", e);
                }
                self.commit_settings(settings, out)?;
                self.set_interval(seconds);
                writeln!(out, "Interval set to {} s", seconds)
            }
        }
    }

    /// Store new settings and adopt them in memory
    fn commit_settings<W: Write>(&mut self, settings: Settings, out: &mut W) -> fmt::Result {
        if let Err(e) = save_settings(&mut self.storage, &settings) {
            warn!("Settings not saved: {}", e);
            writeln!(out, "WARNING: not saved ({}), active until reboot", e)?;
        }
        self.runtime.settings = settings;
        info!("Settings updated");
        Ok(())
    }

    fn run_calibration<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        let table = match self.calibrate_now() {
            Ok(table) => table,
            Err(e) => return writeln!(out, "ERROR: calibration failed: {}", e),
        };

        if let Err(e) = persist_calibration(&mut self.storage, &table) {
            warn!("Calibration not saved: {}", e);
            writeln!(out, "WARNING: not saved ({}), active until reboot", e)?;
        }
        writeln!(
            out,
            "Calibration done: {} of {} positions corrected",
            table.iter().count(),
            table.size().len()
        )?;
        for (position, offset) in table.iter() {
            writeln!(out, "  {} {:+.2}", position, offset)?;
        }
        self.runtime.calibration = table;
        Ok(())
    }

    fn calibrate_now(&mut self) -> Result<CalibrationTable, CalibrationError> {
        if !self.runtime.mode.measuring() {
            return Err(CalibrationError::Busy);
        }
        calibrate(&self.runtime.mapping, &mut self.registry)
    }

    fn reset_calibration<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        if let Err(e) = clear_calibration(&mut self.storage) {
            writeln!(out, "WARNING: stored calibration not erased ({})", e)?;
        }
        self.runtime.calibration = CalibrationTable::new(self.runtime.grid());
        writeln!(out, "Calibration cleared")
    }

    fn reset_all<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        if let Err(e) = clear_mapping(&mut self.storage) {
            writeln!(out, "WARNING: stored mapping not erased ({})", e)?;
        }
        if let Err(e) = clear_calibration(&mut self.storage) {
            writeln!(out, "WARNING: stored calibration not erased ({})", e)?;
        }

        let size = self.runtime.grid();
        self.runtime.mapping = Mapping::new(size);
        self.runtime.calibration = CalibrationTable::new(size);
        self.runtime.mode = self.runtime.mode.transition(Event::MappingCleared);
        self.registry.rediscover();
        self.start_learning();
        info!("Operator reset, relearning {} positions", size.len());

        writeln!(
            out,
            "Mapping and calibration cleared, learning {} positions",
            size.len()
        )?;
        writeln!(out, "Warm the sensor at (0,0)")
    }

    fn show<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        let size = self.runtime.grid();

        match (&self.runtime.mode, &self.runtime.session) {
            (Mode::Learning, Some(session)) => {
                write!(out, "Mode: learning, {}/{} learned", session.learned(), size.len())?;
                match session.next_position() {
                    Some(next) => writeln!(out, ", warm the sensor at {}", next)?,
                    None => writeln!(out)?,
                }
            }
            (Mode::Learning, None) => writeln!(out, "Mode: learning")?,
            (Mode::Normal, _) => writeln!(out, "Mode: normal")?,
            (Mode::Boot, _) => writeln!(out, "Mode: boot")?,
        }
        writeln!(
            out,
            "Grid: {}, {} sensors on bus",
            size,
            self.registry.len()
        )?;

        writeln!(
            out,
            "Mapping ({}/{}):",
            self.runtime.mapping.assigned_count(),
            size.len()
        )?;
        for (position, id) in self.runtime.mapping.iter() {
            match id {
                Some(id) => writeln!(
                    out,
                    "  {} {} {:+.2}",
                    position,
                    id,
                    self.runtime.calibration.offset(position)
                )?,
                None => writeln!(out, "  {} -", position)?,
            }
        }

        if self.runtime.calibration.is_done() {
            writeln!(
                out,
                "Calibration: {} offsets",
                self.runtime.calibration.iter().count()
            )?;
        } else {
            writeln!(out, "Calibration: none")?;
        }

        let settings = &self.runtime.settings;
        if self.runtime.interval_s == settings.interval_s {
            writeln!(out, "Interval: {} s", self.runtime.interval_s)?;
        } else {
            writeln!(
                out,
                "Interval: {} s (remote), stored {} s",
                self.runtime.interval_s, settings.interval_s
            )?;
        }

        let network = &settings.network;
        if network.has_credentials() {
            let password = if network.password.is_empty() {
                "open"
            } else {
                "password set"
            };
            writeln!(out, "WiFi: {} ({})", network.ssid.as_str(), password)?;
        } else {
            writeln!(out, "WiFi: not configured")?;
        }
        if network.has_endpoint() {
            writeln!(out, "Server: {}", network.server_url.as_str())?;
        } else {
            writeln!(out, "Server: not configured")?;
        }

        let link = if self.network.is_connected() { "up" } else { "down" };
        writeln!(
            out,
            "Link: {}, reports sent {}, failed {}",
            link,
            self.reporter.sent(),
            self.reporter.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridPosition, GridSize};
    use crate::learning::StepOutcome;
    use crate::scheduler::tests::{provisioned, rig, Rig};
    use crate::scheduler::Activity;
    use crate::store::{load_calibration, load_mapping, load_settings, MemoryStore};
    use crate::testing::{sensor, FakeNetwork};
    use gridtherm_hal::StorageKey;

    fn run(rig: &mut Rig, line: &str) -> String {
        let mut out = String::new();
        rig.scheduler.handle_line(line, &mut out).unwrap();
        out
    }

    fn measuring() -> Rig {
        let size = GridSize::new(2, 2).unwrap();
        rig(size, 4, provisioned(size), FakeNetwork::connected())
    }

    #[test]
    fn test_help_and_errors() {
        let mut rig = measuring();
        assert!(run(&mut rig, "help").contains("SET INTERVAL"));
        assert_eq!(run(&mut rig, ""), "");
        assert_eq!(run(&mut rig, "FLY"), "ERROR: unknown command, type HELP\n");
    }

    #[test]
    fn test_set_interval_persists_and_applies() {
        let mut rig = measuring();
        assert_eq!(run(&mut rig, "set interval 60"), "Interval set to 60 s\n");
        assert_eq!(rig.scheduler.runtime().interval_s, 60);
        assert_eq!(load_settings(rig.scheduler.storage_mut()).interval_s, 60);

        assert_eq!(rig.tick_after(30_000), Activity::Idle);
        assert!(matches!(rig.tick_after(30_000), Activity::Measured { .. }));
    }

    #[test]
    fn test_short_interval_rejected_without_change() {
        let mut rig = measuring();
        assert!(run(&mut rig, "SET INTERVAL 5").starts_with("ERROR"));
        assert_eq!(rig.scheduler.runtime().interval_s, 30);
        assert_eq!(load_settings(rig.scheduler.storage_mut()).interval_s, 30);
    }

    #[test]
    fn test_set_wifi_reconnects() {
        let mut rig = measuring();
        let reply = run(&mut rig, "SET WIFI Attic s3cr3t");
        assert_eq!(reply, "WiFi set to Attic, reconnecting\n");
        assert_eq!(
            rig.network.reconnects().last().cloned(),
            Some(("Attic".to_string(), "s3cr3t".to_string()))
        );
        let stored = load_settings(rig.scheduler.storage_mut());
        assert_eq!(stored.network.ssid.as_str(), "Attic");
        assert_eq!(stored.network.server_url.as_str(), crate::scheduler::tests::SERVER);
    }

    #[test]
    fn test_set_server() {
        let mut rig = measuring();
        run(&mut rig, "SET SERVER http://Other.host/In");
        assert_eq!(
            rig.scheduler.runtime().settings.network.server_url.as_str(),
            "http://Other.host/In"
        );
    }

    #[test]
    fn test_show_masks_password() {
        let mut rig = measuring();
        let reply = run(&mut rig, "SHOW");
        assert!(reply.contains("Mode: normal"));
        assert!(reply.contains("Mapping (4/4):"));
        assert!(reply.contains("WiFi: Lab (password set)"));
        assert!(!reply.contains("pw"));
    }

    #[test]
    fn test_show_learning_progress() {
        let size = GridSize::new(1, 3).unwrap();
        let mut rig = rig(size, 3, MemoryStore::new(), FakeNetwork::connected());
        rig.touch(1, 23.0);
        let reply = run(&mut rig, "show");
        assert!(reply.contains("Mode: learning, 1/3 learned, warm the sensor at (0,1)"));
    }

    #[test]
    fn test_calibrate_persists_offsets() {
        let mut rig = measuring();
        rig.bus.set(sensor(0), 19.0);
        rig.bus.set(sensor(1), 21.0);
        rig.bus.set(sensor(2), 20.0);
        rig.bus.set(sensor(3), 20.0);

        let reply = run(&mut rig, "CALIBRATE");
        assert!(reply.starts_with("Calibration done: 4 of 4"));
        assert_eq!(
            rig.scheduler
                .runtime()
                .calibration
                .offset(GridPosition::new(0, 0)),
            1.0
        );

        let stored = load_calibration(rig.scheduler.storage_mut(), GridSize::new(2, 2).unwrap());
        assert!(stored.is_done());
        assert_eq!(stored.offset(GridPosition::new(0, 1)), -1.0);
    }

    #[test]
    fn test_calibrate_insufficient_keeps_table() {
        let mut rig = measuring();
        run(&mut rig, "CALIBRATE");
        let before = rig.scheduler.runtime().calibration.clone();

        for n in 0..3 {
            rig.bus.unplug(sensor(n));
        }
        let reply = run(&mut rig, "CALIBRATE");
        assert!(reply.starts_with("ERROR: calibration failed: insufficient sensors"));
        assert_eq!(rig.scheduler.runtime().calibration, before);
    }

    #[test]
    fn test_calibrate_while_learning_is_busy() {
        let size = GridSize::new(1, 2).unwrap();
        let mut rig = rig(size, 2, MemoryStore::new(), FakeNetwork::connected());
        assert_eq!(
            run(&mut rig, "CALIBRATE"),
            "ERROR: calibration failed: learning in progress\n"
        );
    }

    #[test]
    fn test_reset_cal_keeps_mapping() {
        let mut rig = measuring();
        run(&mut rig, "CALIBRATE");
        assert_eq!(run(&mut rig, "reset cal"), "Calibration cleared\n");

        assert!(!rig.scheduler.runtime().calibration.is_done());
        assert_eq!(rig.scheduler.mode(), Mode::Normal);
        let storage = rig.scheduler.storage_mut();
        assert!(!storage.exists(StorageKey::CalibrationDone));
        assert!(storage.exists(StorageKey::MappingComplete));
    }

    #[test]
    fn test_reset_relearns_now_and_after_reboot() {
        let size = GridSize::new(2, 2).unwrap();
        let mut rig = measuring();
        run(&mut rig, "RESET");

        assert_eq!(rig.scheduler.mode(), Mode::Learning);
        assert_eq!(rig.scheduler.runtime().mapping.assigned_count(), 0);
        assert!(matches!(
            rig.touch(3, 25.0),
            Activity::Learning(StepOutcome::Assigned { .. })
        ));

        let mut storage = rig.scheduler.into_storage();
        assert!(!load_mapping(&mut storage, size).is_complete());
        let rebooted = rig_after(size, storage);
        assert_eq!(rebooted.scheduler.mode(), Mode::Learning);
    }

    fn rig_after(size: GridSize, storage: MemoryStore) -> Rig {
        rig(size, 4, storage, FakeNetwork::connected())
    }
}
