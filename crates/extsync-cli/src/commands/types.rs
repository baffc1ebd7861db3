use anyhow::Result;
use extsync_core::SpecificationRegistry;

use crate::cli::OutputFormat;
use crate::output::print_types;

pub fn types(format: OutputFormat) -> Result<()> {
    print_types(&SpecificationRegistry::builtin(), format)
}
