/// Exports the `run` entry point the modserver host looks up in a servlet
/// module.
///
/// `$handler` is a function (or path to one) taking `&mut Servlet<'_>` and
/// returning `()`, a C `int`, or a [`ReturnCode`](crate::ReturnCode).
///
/// ```ignore
/// fn handle(servlet: &mut servlet_core::Servlet<'_>) {
///     servlet.set_header("Content-Type", "text/plain; charset=UTF-8");
///     servlet.rwrite("hello from Rust");
/// }
///
/// servlet_core::declare_servlet!(handle);
/// ```
#[macro_export]
macro_rules! declare_servlet {
    ($handler:path) => {
        #[no_mangle]
        pub extern "C" fn run(s: *mut $crate::RawServlet) -> ::std::os::raw::c_int {
            // SAFETY: `s` is the handle the host passed for this call.
            unsafe { $crate::entry::dispatch(stringify!($handler), s, $handler) }
        }
    };
}
