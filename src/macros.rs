/// Acquires a mutex, mapping a poisoned lock to [`crate::Error::LockError`]
///
/// ```rust, ignore
///  let _guard = lock!(class_lock)?;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().map_err(|_| crate::Error::LockError)
    };
}
