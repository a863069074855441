use std::rc::Rc;

use num_bigint::BigInt;

/// Byte offsets of a node in the source it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

#[derive(Debug, Clone)]
pub struct IdentifierData {
    pub name: String,
    pub meta: Meta,
}

#[derive(Debug, Clone)]
pub enum LiteralType {
    NullLiteral,
    BooleanLiteral(bool),
    StringLiteral(String),
    NumberLiteral(f64),
    BigIntLiteral(BigInt),
}

#[derive(Debug)]
pub struct LiteralData {
    pub meta: Meta,
    pub value: LiteralType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    BitwiseNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOperator {
    PlusPlus,
    MinusMinus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    StrictlyEqual,
    StrictlyUnequal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    BitwiseLeftShift,
    BitwiseRightShift,
    BitwiseUnsignedRightShift,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    InstanceOf,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOperator {
    Or,
    And,
    NullishCoalescing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentOperator {
    Equals,
    AddEquals,
    SubtractEquals,
    MultiplyEquals,
    DivideEquals,
    ModuloEquals,
    ExponentEquals,
    BitwiseLeftShiftEquals,
    BitwiseRightShiftEquals,
    BitwiseUnsignedRightShiftEquals,
    BitwiseOrEquals,
    BitwiseXorEquals,
    BitwiseAndEquals,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies, None for plain `=`.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Equals => None,
            AssignmentOperator::AddEquals => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractEquals => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyEquals => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideEquals => Some(BinaryOperator::Divide),
            AssignmentOperator::ModuloEquals => Some(BinaryOperator::Modulo),
            AssignmentOperator::ExponentEquals => Some(BinaryOperator::Exponent),
            AssignmentOperator::BitwiseLeftShiftEquals => Some(BinaryOperator::BitwiseLeftShift),
            AssignmentOperator::BitwiseRightShiftEquals => Some(BinaryOperator::BitwiseRightShift),
            AssignmentOperator::BitwiseUnsignedRightShiftEquals => {
                Some(BinaryOperator::BitwiseUnsignedRightShift)
            }
            AssignmentOperator::BitwiseOrEquals => Some(BinaryOperator::BitwiseOr),
            AssignmentOperator::BitwiseXorEquals => Some(BinaryOperator::BitwiseXor),
            AssignmentOperator::BitwiseAndEquals => Some(BinaryOperator::BitwiseAnd),
        }
    }
}

#[derive(Debug)]
pub enum MemberExpressionType {
    SimpleMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: IdentifierData,
    },
    ComputedMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: Box<ExpressionType>,
    },
}

impl HasMeta for MemberExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            MemberExpressionType::SimpleMemberExpression { meta, .. } => meta,
            MemberExpressionType::ComputedMemberExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub enum PropertyKeyType {
    Static(String),
    Computed(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct PropertyData {
    pub meta: Meta,
    pub key: PropertyKeyType,
    pub value: ExpressionType,
}

#[derive(Debug)]
pub enum ExpressionType {
    Literal(LiteralData),
    Identifier(IdentifierData),
    ThisExpression {
        meta: Meta,
    },
    ArrayExpression {
        meta: Meta,
        elements: Vec<ExpressionType>,
    },
    ObjectExpression {
        meta: Meta,
        properties: Vec<PropertyData>,
    },
    FunctionExpression(Rc<FunctionData>),
    ArrowFunctionExpression(Rc<FunctionData>),
    UnaryExpression {
        meta: Meta,
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    UpdateExpression {
        meta: Meta,
        operator: UpdateOperator,
        argument: Box<ExpressionType>,
        prefix: bool,
    },
    BinaryExpression {
        meta: Meta,
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        meta: Meta,
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    AssignmentExpression {
        meta: Meta,
        operator: AssignmentOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    CallExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    NewExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionType>,
    },
    MemberExpression(MemberExpressionType),
    SequenceExpression {
        meta: Meta,
        expressions: Vec<ExpressionType>,
    },
}

impl ExpressionType {
    /// Identifiers and member expressions; the only valid assignment targets.
    pub fn is_valid_simple_assignment_target(&self) -> bool {
        matches!(
            self,
            ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_)
        )
    }
}

impl HasMeta for ExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            ExpressionType::Literal(d) => &d.meta,
            ExpressionType::Identifier(d) => &d.meta,
            ExpressionType::FunctionExpression(f) | ExpressionType::ArrowFunctionExpression(f) => {
                &f.meta
            }
            ExpressionType::MemberExpression(m) => m.get_meta(),
            ExpressionType::ThisExpression { meta }
            | ExpressionType::ArrayExpression { meta, .. }
            | ExpressionType::ObjectExpression { meta, .. }
            | ExpressionType::UnaryExpression { meta, .. }
            | ExpressionType::UpdateExpression { meta, .. }
            | ExpressionType::BinaryExpression { meta, .. }
            | ExpressionType::LogicalExpression { meta, .. }
            | ExpressionType::AssignmentExpression { meta, .. }
            | ExpressionType::ConditionalExpression { meta, .. }
            | ExpressionType::CallExpression { meta, .. }
            | ExpressionType::NewExpression { meta, .. }
            | ExpressionType::SequenceExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub enum FunctionBodyType {
    Block(Vec<StatementType>),
    /// Concise arrow body: `x => x * 2`.
    Expression(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct FunctionData {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub params: Vec<IdentifierData>,
    pub body: FunctionBodyType,
    pub is_arrow: bool,
    /// Every `var` declared in the body, excluding nested functions.
    pub var_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableDeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: IdentifierData,
    pub init: Option<ExpressionType>,
}

#[derive(Debug)]
pub struct VariableDeclarationData {
    pub meta: Meta,
    pub kind: VariableDeclarationKind,
    pub declarations: Vec<VariableDeclaratorData>,
}

#[derive(Debug)]
pub enum ForInitType {
    VariableDeclaration(VariableDeclarationData),
    Expression(ExpressionType),
}

#[derive(Debug)]
pub struct CatchClauseData {
    pub meta: Meta,
    pub param: Option<IdentifierData>,
    pub body: Vec<StatementType>,
}

#[derive(Debug)]
pub enum StatementType {
    ExpressionStatement {
        meta: Meta,
        expression: ExpressionType,
    },
    BlockStatement {
        meta: Meta,
        body: Vec<StatementType>,
    },
    EmptyStatement {
        meta: Meta,
    },
    VariableDeclaration(VariableDeclarationData),
    FunctionDeclaration(Rc<FunctionData>),
    IfStatement {
        meta: Meta,
        test: ExpressionType,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    WhileStatement {
        meta: Meta,
        test: ExpressionType,
        body: Box<StatementType>,
    },
    DoWhileStatement {
        meta: Meta,
        body: Box<StatementType>,
        test: ExpressionType,
    },
    ForStatement {
        meta: Meta,
        init: Option<ForInitType>,
        test: Option<ExpressionType>,
        update: Option<ExpressionType>,
        body: Box<StatementType>,
    },
    BreakStatement {
        meta: Meta,
    },
    ContinueStatement {
        meta: Meta,
    },
    ReturnStatement {
        meta: Meta,
        argument: Option<ExpressionType>,
    },
    ThrowStatement {
        meta: Meta,
        argument: ExpressionType,
    },
    TryStatement {
        meta: Meta,
        block: Vec<StatementType>,
        handler: Option<CatchClauseData>,
        finalizer: Option<Vec<StatementType>>,
    },
}

impl HasMeta for StatementType {
    fn get_meta(&self) -> &Meta {
        match self {
            StatementType::VariableDeclaration(d) => &d.meta,
            StatementType::FunctionDeclaration(f) => &f.meta,
            StatementType::ExpressionStatement { meta, .. }
            | StatementType::BlockStatement { meta, .. }
            | StatementType::EmptyStatement { meta }
            | StatementType::IfStatement { meta, .. }
            | StatementType::WhileStatement { meta, .. }
            | StatementType::DoWhileStatement { meta, .. }
            | StatementType::ForStatement { meta, .. }
            | StatementType::BreakStatement { meta }
            | StatementType::ContinueStatement { meta }
            | StatementType::ReturnStatement { meta, .. }
            | StatementType::ThrowStatement { meta, .. }
            | StatementType::TryStatement { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub struct ProgramData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
    pub var_names: Vec<String>,
}
