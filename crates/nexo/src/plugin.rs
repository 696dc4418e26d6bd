// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The plugin seam for the outer UI panels (slash menu, floating
//! toolbar, drag handle).
//!
//! Plugins are pure consumers: they observe the controller's events and
//! the compiler's element introspection, and mutate the document only
//! through controller operations.

use crate::controller::EditorController;
use crate::render::Compiler;

pub trait Plugin {
    fn name(&self) -> &str;

    /// Called once when the plugin is attached to a live editor.
    fn init(&mut self, controller: &mut EditorController, compiler: &mut Compiler);

    /// Called when the editor (or the plugin) is torn down.
    fn destroy(&mut self) {}
}

/// Owns the attached plugins and their lifecycle order.
#[derive(Default)]
pub struct PluginHost {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(
        &mut self,
        mut plugin: Box<dyn Plugin>,
        controller: &mut EditorController,
        compiler: &mut Compiler,
    ) {
        plugin.init(controller, compiler);
        self.plugins.push(plugin);
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    /// Destroy in reverse attach order.
    pub fn destroy_all(&mut self) {
        for plugin in self.plugins.iter_mut().rev() {
            plugin.destroy();
        }
        self.plugins.clear();
    }
}
