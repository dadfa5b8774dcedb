//! Structural elements module

mod material;
mod member;
mod node;
mod section;
mod support;

pub use material::{concrete_modulus_ksi, Material, MaterialModel};
pub use member::{ElementKind, Member, MemberEndForces};
pub use node::Node;
pub use section::Section;
pub use support::{Dof, Support};
