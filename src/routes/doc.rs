use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, SetupResult},
        coupons::{ApplyCouponRequest, CouponDto, CouponList, CouponVerdict},
        menu::{CategoryDto, CategoryList, MenuData, MenuItemDto, MenuItemList},
        orders::{
            BoardItem, BoardList, BoardOrder, CreateOrderRequest, DashboardStats, MyOrdersList,
            OrderData, OrderItemInput, OrderItemView, OrderList, OrderView, OrderWithItems,
        },
        payments::{
            CreateIntentRequest, CreateIntentResponse, IntentOrder, PaymentErrorBody,
            VerifiedOrder, VerifyPaymentRequest, VerifyPaymentResponse,
        },
        settings::{SettingsDto, UpdateSettingsRequest},
        tables::{TableDto, TableList},
    },
    models::{CustomerSummary, Profile},
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, coupons, events, health, menu, orders, params, payments,
        settings as settings_routes, tables as table_routes,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        menu::get_menu,
        table_routes::list_tables,
        coupons::apply_coupon,
        settings_routes::get_settings,
        orders::create_order,
        orders::list_my_orders,
        orders::kitchen_board,
        orders::get_order,
        payments::create_intent,
        payments::verify_payment,
        events::change_stream,
        admin::setup,
        admin::dashboard,
        admin::list_customers,
        admin::customer_orders,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::advance_order,
        admin::delete_order,
        admin::list_categories,
        admin::create_category,
        admin::update_category,
        admin::delete_category,
        admin::list_menu_items,
        admin::create_menu_item,
        admin::update_menu_item,
        admin::toggle_menu_item,
        admin::delete_menu_item,
        admin::list_tables,
        admin::create_table,
        admin::update_table,
        admin::toggle_table,
        admin::delete_table,
        admin::list_coupons,
        admin::create_coupon,
        admin::update_coupon,
        admin::toggle_coupon,
        admin::delete_coupon,
        admin::update_settings
    ),
    components(
        schemas(
            Profile,
            CustomerSummary,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            SetupResult,
            CategoryDto,
            MenuItemDto,
            MenuData,
            CategoryList,
            MenuItemList,
            TableDto,
            TableList,
            ApplyCouponRequest,
            CouponDto,
            CouponVerdict,
            CouponList,
            OrderItemInput,
            CreateOrderRequest,
            OrderData,
            OrderView,
            OrderItemView,
            OrderWithItems,
            OrderList,
            MyOrdersList,
            BoardItem,
            BoardOrder,
            BoardList,
            DashboardStats,
            CreateIntentRequest,
            IntentOrder,
            CreateIntentResponse,
            VerifyPaymentRequest,
            VerifiedOrder,
            VerifyPaymentResponse,
            PaymentErrorBody,
            SettingsDto,
            UpdateSettingsRequest,
            admin::CreateCategoryRequest,
            admin::UpdateCategoryRequest,
            admin::CreateMenuItemRequest,
            admin::UpdateMenuItemRequest,
            admin::CreateTableRequest,
            admin::UpdateTableRequest,
            admin::CreateCouponRequest,
            admin::UpdateCouponRequest,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<MenuData>,
            ApiResponse<TableList>,
            ApiResponse<CouponVerdict>,
            ApiResponse<SettingsDto>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<MyOrdersList>,
            ApiResponse<BoardList>,
            ApiResponse<DashboardStats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Menu", description = "Customer menu"),
        (name = "Tables", description = "Cafe tables"),
        (name = "Coupons", description = "Coupon validation"),
        (name = "Settings", description = "Cafe settings"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Payment gateway endpoints"),
        (name = "Events", description = "Realtime change feed"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
    //.custom_html(SCALAR_HTML)
}
