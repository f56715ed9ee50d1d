/*
 * This file is part of devprint.
 *
 * Copyright (C) 2025 devprint contributors
 *
 * devprint is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * devprint is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with devprint. If not, see <https://www.gnu.org/licenses/>.
 */

//! devprint - device fingerprint CLI for Linux
//!
//! Wires Linux host collaborators into the `dp-core` fusion pipeline and
//! prints the resulting final state.

pub mod cli;
pub mod host;
pub mod logging;
