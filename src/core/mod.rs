// ─── CatClient Core ───
// Headless install-and-launch engine for manifest-described game versions.
//
// Architecture:
//   core/
//     scanner/    — Structural JSON field extraction
//     version/    — Manifest, descriptors, platform rules, catalog
//     libraries/  — Rule evaluation + library/native fetch
//     assets/     — Asset index + content-addressed object sync
//     downloader/ — Concurrent downloads with atomic placement
//     launch/     — Natives, command builder, Java probe, process supervisor
//     pipeline/   — Per-attempt orchestration, reporter, version lock
//     auth/       — Launch identity handed over by an external provider
//     state/      — Settings and on-disk layout

pub mod assets;
pub mod auth;
pub mod downloader;
pub mod error;
pub mod http;
pub mod launch;
pub mod libraries;
pub mod pipeline;
pub mod scanner;
pub mod state;
pub mod version;
