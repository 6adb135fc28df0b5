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
    domain::{
        cart::CartLine,
        permissions::{Page, Role, RolePermissions},
        sales::{SalesEntry, SalesReport},
        status::{OrderStatus, PaymentStatus},
    },
    dto::{
        auth::{LoginRequest, LoginResponse, Me, PageAccess},
        items::{ImportSummary, ItemList, MenuPage, UpdateItemRequest},
        orders::{
            AdvanceByTicketRequest, CreateOrderResponse, OrderDetail, OrderList, TicketQuery,
            UpdateOrderStatusRequest, UpdatePaymentStatusRequest,
        },
        signage::{SignageFeed, SignageList, UpdateSignageRequest},
        users::{AddUserRequest, DeleteUserRequest, UserList},
    },
    models::{MenuItem, Order, SignageItem, SignageSettings, User},
    response::{Ack, ApiResponse, Meta},
    routes::{auth, health, items, menu, orders, reset, sales, settings, signage, users},
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
        auth::login,
        auth::me,
        auth::access,
        menu::menu,
        menu::store_info,
        menu::create_order,
        orders::list_orders,
        orders::get_order,
        orders::get_order_by_ticket,
        orders::update_order_status,
        orders::advance_by_ticket,
        orders::update_payment_status,
        items::get_items,
        items::update_item,
        items::upload_csv,
        items::download_template_csv,
        signage::get_signage_items,
        signage::get_signage_list,
        signage::update_signage_item,
        signage::upload_signage_csv,
        signage::download_signage_template_csv,
        sales::get_sales_data,
        sales::download_sales_csv,
        users::get_users,
        users::add_user,
        users::delete_user,
        settings::get_permissions,
        settings::update_permissions,
        settings::get_store_settings,
        settings::update_store_settings,
        reset::reset_data,
        reset::reset_all,
        reset::reset_super
    ),
    components(
        schemas(
            Role,
            Page,
            RolePermissions,
            OrderStatus,
            PaymentStatus,
            CartLine,
            MenuItem,
            Order,
            SignageItem,
            SignageSettings,
            User,
            LoginRequest,
            LoginResponse,
            Me,
            PageAccess,
            MenuPage,
            ItemList,
            UpdateItemRequest,
            ImportSummary,
            CreateOrderResponse,
            UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
            AdvanceByTicketRequest,
            TicketQuery,
            OrderList,
            OrderDetail,
            SignageFeed,
            SignageList,
            UpdateSignageRequest,
            UserList,
            AddUserRequest,
            DeleteUserRequest,
            SalesEntry,
            SalesReport,
            Ack,
            Meta,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<Order>,
            ApiResponse<MenuPage>,
            ApiResponse<SalesReport>,
            ApiResponse<Ack>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Staff login and page access"),
        (name = "Menu", description = "Customer menu and checkout"),
        (name = "Orders", description = "Order lifecycle and monitors"),
        (name = "Signage", description = "Signage playlist"),
        (name = "Admin", description = "Menu administration and sales"),
        (name = "Users", description = "Account management"),
        (name = "Settings", description = "Role permissions and store settings"),
        (name = "Reset", description = "Bulk data resets"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
