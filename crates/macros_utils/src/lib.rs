//! Small declarative helpers shared by the HTTP apps

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix;

/// Generate a `pub fn routes(cfg: &mut ServiceConfig)` for a route module
///
/// `route <handler>` registers an actix-web service; `mount <module>` pulls
/// in the `routes` function of a child module.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     mount stations,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    (@register $cfg:ident, route $handler:tt) => {
        $cfg.service($handler);
    };
    (@register $cfg:ident, mount $module:ident) => {
        $module::routes($cfg);
    };
    ($($kind:ident $target:tt),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix::web::ServiceConfig) {
            $( $crate::routes!(@register cfg, $kind $target); )*
        }
    };
}
