// Copyright 2026 Marta Vidal
pub mod auth;
pub mod home;
