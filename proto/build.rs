use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::{}", input))
        .output_type(format!("crate::{}", output))
        .codec_path(CODEC)
        .build()
}

fn main() {
    let account_service = Service::builder()
        .name("AccountService")
        .package("rollcall")
        .method(unary(
            "register_account",
            "RegisterAccount",
            "RegisterAccountRequest",
            "RegisterAccountReply",
        ))
        .method(unary(
            "get_account",
            "GetAccount",
            "GetAccountRequest",
            "GetAccountReply",
        ))
        .build();

    let market_service = Service::builder()
        .name("MarketService")
        .package("rollcall")
        .method(unary(
            "register_order",
            "RegisterOrder",
            "RegisterOrderRequest",
            "RegisterOrderReply",
        ))
        .method(
            Method::builder()
                .name("subscribe_transactions")
                .route_name("SubscribeTransactions")
                .input_type("crate::SubscribeTransactionsRequest")
                .output_type("crate::Transaction")
                .codec_path(CODEC)
                .server_streaming()
                .build(),
        )
        .build();

    Builder::new().compile(&[account_service, market_service]);
    println!("cargo:rerun-if-changed=build.rs");
}
