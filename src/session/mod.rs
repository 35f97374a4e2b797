//! Session lifecycle: backend client, load/save orchestration, and AI
//! description generation.

pub mod client;
pub mod generate;
pub mod lifecycle;

pub use client::{
    GenerateRoomResponse, SessionClient, SessionData, SessionResponse, UsageStats,
    GENERATION_TIMEOUT,
};
pub use generate::{
    generate_descriptions, skip_channel, GenerationReport, SkipSignal, SkipSwitch, TARGET_WORDS,
};
pub use lifecycle::{
    load, save, AutoSave, HandoffData, LoadOptions, LoadSource, MemoryCache, SaveOutcome,
    SessionCache, AUTO_SAVE_INTERVAL, LOAD_TIMEOUT,
};
