#![allow(dead_code)]

pub mod immich_server;
