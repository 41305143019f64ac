//! Flutter-facing bindings over `smarttodo_core`.

pub mod api;
