// Error handling macros
// Provides macros for simplified validation

/// Return early with the given error if a condition is not satisfied
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error:expr) => {
        if !($cond) {
            return Err($error);
        }
    };
}

/// Return early with the given error
#[macro_export]
macro_rules! bail {
    ($error:expr) => {
        return Err($error)
    };
}
