//! Logging abstraction
//!
//! Provides unified logging macros that work across targets:
//! - Embedded (`defmt` feature): uses defmt
//! - Host tests and mock builds: uses println!/eprintln!
//! - Anything else: no-op
//!
//! All modules in this crate log through these macros so that the store can be
//! exercised on the host without pulling in an embedded logging transport.

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), any(test, feature = "mock")))]
        ::std::println!("[DEBUG] {}", ::std::format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(any(test, feature = "mock"))))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log info message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), any(test, feature = "mock")))]
        ::std::println!("[INFO] {}", ::std::format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(any(test, feature = "mock"))))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), any(test, feature = "mock")))]
        ::std::println!("[WARN] {}", ::std::format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(any(test, feature = "mock"))))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), any(test, feature = "mock")))]
        ::std::eprintln!("[ERROR] {}", ::std::format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(any(test, feature = "mock"))))]
        let _ = ::core::format_args!($($arg)*);
    }};
}
