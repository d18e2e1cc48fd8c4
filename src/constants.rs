//! Centralized constants for the assignment engine
//!
//! This module contains all hardcoded constants used throughout the codebase.
//! All new constants should be added here rather than scattered throughout the code.
//! Constants are organized by category for easy reference and maintenance.

// ============================================================================
// PARALLELISM CONSTANTS
// ============================================================================

/// Units of work a task should carry before another thread is worth starting
pub const DEFAULT_CHUNK: usize = 64 * 1024;

/// Tasks created per thread when work is split, for load balance
pub const DEFAULT_TASKS_PER_THREAD: usize = 4;

/// Minimum number of fine tasks a vector is split into once it is split at all
pub const MIN_FINE_TASKS_PER_VECTOR: usize = 2;

// ============================================================================
// DISPLAY AND DEBUG CONSTANTS
// ============================================================================

/// Maximum columns to print in debug display
pub const MAX_DISPLAY_VECTORS: usize = 5;

/// Maximum entries per column in debug display
pub const MAX_DISPLAY_ENTRIES_PER_VECTOR: usize = 5;
