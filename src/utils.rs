pub fn set_panic_hook() {
    // Panics surface in the browser console instead of an opaque
    // "unreachable executed" trap.
    console_error_panic_hook::set_once();
}
