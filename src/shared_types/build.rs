use anyhow::Result;
use crux_core::typegen::TypeGen;
use pitop_onboarding_core::{
    events::{SocketEvent, UpgradeEvent},
    types::{ErrorType, UpdateState, UpdaterCommand},
    App,
};
use std::path::PathBuf;

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=../app");

    let mut gen = TypeGen::new();

    gen.register_app::<App>()?;

    // Explicitly register domain event enums to ensure all variants are traced
    gen.register_type::<UpgradeEvent>()?;
    gen.register_type::<SocketEvent>()?;

    // Explicitly register other enums to ensure all variants are traced
    gen.register_type::<UpdateState>()?;
    gen.register_type::<ErrorType>()?;
    gen.register_type::<UpdaterCommand>()?;

    let output_root = PathBuf::from("./generated");

    gen.typescript("shared_types", output_root.join("typescript"))?;

    Ok(())
}
