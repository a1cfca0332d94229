// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Defines binding types */

pub mod binding_instance;
pub mod error;
pub mod objects;
pub mod pipeline_layout;
pub mod resource_binding_map;
pub mod resource_cache;
pub mod resource_desc;
pub mod resource_mapping;
pub mod sampler;
pub mod signature;
pub mod variable_manager;
pub mod visible_to;

mod bind_resource;

pub use binding_instance::BindingInstance;
pub use error::{BindError, BindErrors, PipelineLayoutError, SignatureError};
pub use pipeline_layout::PipelineLayout;
pub use signature::{Signature, SignatureLayout};
