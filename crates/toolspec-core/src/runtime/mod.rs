// toolspec-core/src/runtime/mod.rs
// ============================================================================
// Module: ToolSpec Runtime
// Description: Runtime helpers shared by server backends.
// Purpose: Provide the access gate and the in-memory reference store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime layer combines storage reads with the pure gating state
//! machine and provides an in-memory store used by tests and by server
//! deployments that do not need durability.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod gate;
pub mod memory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use gate::AccessGate;
pub use gate::AccessStatusReport;
pub use gate::RegistryStore;
pub use gate::SharedRegistryStore;
pub use memory::InMemoryRegistryStore;
