// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod ai;
pub mod budget;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod editor;
pub mod engine;
pub mod error;
pub mod models;
pub mod remote;
pub mod session;
pub mod utils;
pub mod voice;
