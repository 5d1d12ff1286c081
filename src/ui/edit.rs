// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Widget values that are committed once, when the pointer is released.

/// A value being dragged in a slider or color picker.
#[derive(Debug)]
pub struct PendingEdit<T> {
    value: Option<T>,
}

impl<T> Default for PendingEdit<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> PendingEdit<T> {
    pub fn update(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn current(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Hand out the edited value once no pointer button is held.
    pub fn release(&mut self, pointer_down: bool) -> Option<T> {
        if pointer_down {
            None
        } else {
            self.value.take()
        }
    }
}
