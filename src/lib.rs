// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

pub mod broker;
pub mod channel;
pub mod configs;
pub mod connector;
pub mod endpoint;
pub mod errors;
pub mod provision;
pub mod queue;
pub mod topology;
