// handlers/protected/mod.rs - Session required
//
// Route Prefix: /api/*
// Middleware: session_middleware injects the RequestContext; every handler
// then runs its own access check before touching the store.
pub mod data;
