//! Text command front end
//!
//! A small shell-style interface over the store, for a serial console or a
//! debug link:
//!
//! ```text
//! param init              -Initialize parameter module.
//! param list              -List display all params.
//! param load              -Load all params from flash.
//! param save              -Save all params to flash.
//! param resume name       -Resume the param to default by name.
//! param read name         -Read the param by name.
//! param write name val    -Write the param by name.
//! ```
//!
//! The console owns the store lifecycle: `init` builds it over the partition
//! handle, `deinit` tears it down and recovers the handle so `init` can run
//! again. Every other command reports "not initialized" while no store
//! exists. Output goes to any [`core::fmt::Write`] sink.

use core::fmt::{self, Write};

use super::marshal;
use super::store::ParamStore;
use super::table::{ParamDesc, ParamKind};
use super::ParamError;
use crate::platform::traits::FlashPartition;

/// Largest field the read/write staging buffer can hold
const VALUE_BUF: usize = 128;

/// Console front end over a parameter store
pub struct ParamConsole<F: FlashPartition> {
    descs: &'static [ParamDesc],
    flash: Option<F>,
    store: Option<ParamStore<F>>,
}

impl<F: FlashPartition> ParamConsole<F> {
    /// Create the console; the store itself comes up on the `init` command
    pub fn new(flash: F, descs: &'static [ParamDesc]) -> Self {
        Self {
            descs,
            flash: Some(flash),
            store: None,
        }
    }

    /// Direct access to the store, if initialized
    pub fn store(&mut self) -> Option<&mut ParamStore<F>> {
        self.store.as_mut()
    }

    /// Dispatch one command line, already split into words
    pub fn handle(&mut self, args: &[&str], out: &mut impl Write) -> fmt::Result {
        match args {
            [] => self.usage(out),
            ["init"] => self.cmd_init(out),
            ["deinit"] => self.cmd_deinit(out),
            ["list"] => self.cmd_list(out),
            ["load"] => self.cmd_load(out),
            ["save"] => self.cmd_save(out),
            ["resume"] => writeln!(out, "param resume name       -Resume the param to default by name."),
            ["resume", name] => self.cmd_resume(name, out),
            ["read"] => writeln!(out, "param read name         -Read the param by name."),
            ["read", name] => self.cmd_read(name, out),
            ["write"] | ["write", _] => {
                writeln!(out, "param write name val    -Write the param by name.")
            }
            ["write", name, value] => self.cmd_write(name, value, out),
            _ => writeln!(out, "error! unsupported parameters."),
        }
    }

    fn usage(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "Usage: ")?;
        writeln!(out, "param init              -Initialize parameter module.")?;
        writeln!(out, "param list              -List display all params.")?;
        writeln!(out, "param load              -Load all params from flash.")?;
        writeln!(out, "param save              -Save all params to flash.")?;
        writeln!(out, "param resume name       -Resume the param to default by name.")?;
        writeln!(out, "param read name         -Read the param by name.")?;
        writeln!(out, "param write name val    -Write the param by name.")?;
        writeln!(out)
    }

    fn cmd_init(&mut self, out: &mut impl Write) -> fmt::Result {
        if self.store.is_some() {
            return writeln!(out, "param init success.");
        }
        let Some(flash) = self.flash.take() else {
            return writeln!(out, "param init error: storage unavailable");
        };
        match ParamStore::init(flash, self.descs) {
            Ok(store) => {
                self.store = Some(store);
                writeln!(out, "param init success.")
            }
            Err(e) => writeln!(out, "param init error: {}", e),
        }
    }

    fn cmd_deinit(&mut self, out: &mut impl Write) -> fmt::Result {
        if let Some(store) = self.store.take() {
            self.flash = Some(store.release());
        }
        writeln!(out, "param deinit success.")
    }

    fn cmd_list(&mut self, out: &mut impl Write) -> fmt::Result {
        let Some(store) = self.store.as_ref() else {
            return writeln!(out, "{}", ParamError::NotInitialized);
        };

        writeln!(out)?;
        writeln!(out, "name              type    size  value          ")?;
        writeln!(out, "----------------  ------  ----  -------------  ")?;
        for idx in 0..store.count() {
            let desc = store.descs()[idx];
            write!(out, "{:<18}", desc.name)?;
            write_type(out, &desc)?;
            write!(out, "{:<6}", desc.size)?;
            write_value(out, store, idx, &desc)?;
            writeln!(out)?;
        }
        writeln!(out, "---- param total : {} ----", store.count())
    }

    fn cmd_load(&mut self, out: &mut impl Write) -> fmt::Result {
        let Some(store) = self.store.as_mut() else {
            return writeln!(out, "{}", ParamError::NotInitialized);
        };
        match store.load_from_flash() {
            Ok(()) => writeln!(out, "param load success."),
            Err(e) => writeln!(out, "param load error: {}", e),
        }
    }

    fn cmd_save(&mut self, out: &mut impl Write) -> fmt::Result {
        let Some(store) = self.store.as_mut() else {
            return writeln!(out, "{}", ParamError::NotInitialized);
        };
        match store.save_to_flash() {
            Ok(()) => writeln!(out, "param save success."),
            Err(e) => writeln!(out, "param save error: {}", e),
        }
    }

    fn cmd_resume(&mut self, name: &str, out: &mut impl Write) -> fmt::Result {
        let Some(store) = self.store.as_mut() else {
            return writeln!(out, "{}", ParamError::NotInitialized);
        };
        if name == "all" {
            store.resume_all();
            return writeln!(out, "resume all param success.");
        }
        match store.resume_by_name(name) {
            Ok(()) => writeln!(out, "resume param success, the name is {}", name),
            Err(_) => writeln!(out, "this param don`t exist, the name is {}", name),
        }
    }

    fn cmd_read(&mut self, name: &str, out: &mut impl Write) -> fmt::Result {
        let Some(store) = self.store.as_ref() else {
            return writeln!(out, "{}", ParamError::NotInitialized);
        };
        let Ok(idx) = store.find(name) else {
            return writeln!(out, "this param don`t exist, the name is {}", name);
        };
        let desc = store.descs()[idx];
        write_value(out, store, idx, &desc)?;
        writeln!(out)
    }

    fn cmd_write(&mut self, name: &str, value: &str, out: &mut impl Write) -> fmt::Result {
        let Some(store) = self.store.as_mut() else {
            return writeln!(out, "{}", ParamError::NotInitialized);
        };
        let Ok(idx) = store.find(name) else {
            return writeln!(out, "this param don`t exist, the name is {}", name);
        };
        let desc = store.descs()[idx];
        if desc.size > VALUE_BUF {
            return writeln!(out, "write param error, the name is {}", name);
        }

        // Parse the text into a staging buffer at the field's own width, then
        // push it through the normal write path
        let mut buf = [0u8; VALUE_BUF];
        let staged = &mut buf[..desc.size];
        marshal::from_text(desc.kind, staged, value);

        match store.write_by_index(idx, staged) {
            Ok(()) => writeln!(out, "write param success, the name is {}", name),
            Err(_) => writeln!(out, "write param error, the name is {}", name),
        }
    }
}

/// Print the human-readable type name, padded for the list columns
fn write_type(out: &mut impl Write, desc: &ParamDesc) -> fmt::Result {
    match desc.kind {
        ParamKind::Str => write!(out, "{:<8}", "string"),
        ParamKind::Array => write!(out, "{:<8}", "array"),
        ParamKind::Int => write!(out, "int{:<5}", desc.size * 8),
        ParamKind::Hex => write!(out, "hex{:<5}", desc.size * 8),
        ParamKind::Float if desc.size == 4 => write!(out, "{:<8}", "float"),
        ParamKind::Float => write!(out, "{:<8}", "double"),
    }
}

/// Print a field's current value in its display form
fn write_value<F: FlashPartition>(
    out: &mut impl Write,
    store: &ParamStore<F>,
    idx: usize,
    desc: &ParamDesc,
) -> fmt::Result {
    let mut buf = [0u8; VALUE_BUF];
    let len = desc.size.min(VALUE_BUF);
    if store.read_by_index(idx, &mut buf[..len]).is_err() {
        return write!(out, "<read error>");
    }

    match desc.kind {
        ParamKind::Str => {
            let end = buf[..len].iter().position(|&b| b == 0).unwrap_or(len);
            for &b in &buf[..end] {
                out.write_char(b as char)?;
            }
            Ok(())
        }
        ParamKind::Array => {
            for (i, b) in buf[..len].iter().enumerate() {
                if i != 0 {
                    write!(out, " ")?;
                }
                write!(out, "{:02X}", b)?;
            }
            Ok(())
        }
        ParamKind::Int => {
            if desc.size == 4 {
                write!(out, "{}", i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            } else {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[..8]);
                write!(out, "{}", i64::from_le_bytes(raw))
            }
        }
        ParamKind::Hex => {
            if desc.size == 4 {
                write!(out, "{:08X}", u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            } else {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[..8]);
                write!(out, "{:016X}", u64::from_le_bytes(raw))
            }
        }
        ParamKind::Float => {
            if desc.size == 4 {
                write!(out, "{:.3}", f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
            } else {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[..8]);
                write!(out, "{:.5}", f64::from_le_bytes(raw))
            }
        }
    }
}
