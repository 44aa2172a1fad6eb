//! Build-time configuration of the packetlink firmware
//!
//! Reads the JSON link configuration and generates the Rust source of
//! `packetlink::config::CONFIG`. Used from the firmware's `build.rs`.

pub mod format;

use std::{path::Path, fs::File, io::{Write, BufReader}};

use anyhow::{bail, Context};
use proc_macro2::TokenStream;
use quote::{quote, ToTokens, TokenStreamExt};
use serde::{Serialize, Deserialize};
use schemars::{JsonSchema, schema_for, schema::RootSchema};

/// Baud rates accepted by the host application
pub const BAUD_RATES: &[u32] = &[9_600, 19_200, 38_400, 57_600, 115_200];

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// UART baud rate
    baud_rate: u32,
    /// Initial 16-bit tower number
    tower_number: u16,
    /// Send NAK when a command requesting acknowledgement fails
    nak_on_failure: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 38_400,
            tower_number: 1291,
            nak_on_failure: true,
        }
    }
}

impl ToTokens for LinkConfig {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let baud_rate = &self.baud_rate;
        let tower_number = &self.tower_number;
        let nak_on_failure = &self.nak_on_failure;
        tokens.append_all(quote! {
            crate::config::LinkConfig {
                baud_rate: #baud_rate,
                tower_number: #tower_number,
                nak_on_failure: #nak_on_failure,
            }
        })
    }
}

impl LinkConfig {
    fn file_tokens(&self) -> TokenStream {
        quote! {
            pub static CONFIG: crate::config::LinkConfig = #self;
        }
    }

    fn to_string_pretty(&self) -> anyhow::Result<String> {
        let file = self.file_tokens();
        format::format_items(file.clone())
            .context(format!("Failed to parse:\n{}", file))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !BAUD_RATES.contains(&self.baud_rate) {
            bail!("Unsupported baud rate {}, expected one of {:?}", self.baud_rate, BAUD_RATES);
        }
        Ok(())
    }

    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        let code = self.to_string_pretty()?;
        file.write_all(code.as_bytes())?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(&mut reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn schema() -> RootSchema {
        schema_for!(Self)
    }

    pub fn schema_to_file(path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        let schema = Self::schema();
        let string = serde_json::to_string_pretty(&schema)?;
        file.write_all(string.as_bytes())?;
        Ok(())
    }
}
