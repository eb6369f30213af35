//! Integration tests for the network plugin, driven by the `TestNetwork`
//! harness (headless Bevy app, `FixedUpdate` ticked by hand).
