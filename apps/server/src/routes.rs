mod health;
mod stations;
mod status;

macros_utils::routes! {
    mount health,
    mount status,
    mount stations,
}


/// Build a test service over the full route table
#[cfg(test)]
macro_rules! test_app {
    ($store:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($crate::routes::testing::data(&$store))
                .configure($crate::routes::routes),
        )
        .await
    };
}

#[cfg(test)]
pub(crate) use test_app;
